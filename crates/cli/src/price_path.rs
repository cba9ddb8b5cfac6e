use anyhow::{Result, anyhow};
use limit_order_domain::value_objects::price::Price;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

pub trait PricePathGenerator {
    fn generate(&mut self, steps: usize) -> Result<Vec<Price>>;
}

/// Geometric Brownian motion driven by a seeded generator, so a given seed
/// always yields the same path.
pub struct GeometricBrownianMotion {
    pub initial_price: Decimal,
    pub drift: f64,      // annualized drift (mu)
    pub volatility: f64, // annualized volatility (sigma)
    pub time_step: f64,  // time step in years (dt)
    rng: StdRng,
}

impl GeometricBrownianMotion {
    pub fn new(initial_price: Decimal, drift: f64, volatility: f64, time_step: f64, seed: u64) -> Self {
        Self {
            initial_price,
            drift,
            volatility,
            time_step,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl PricePathGenerator for GeometricBrownianMotion {
    fn generate(&mut self, steps: usize) -> Result<Vec<Price>> {
        let mut prices = Vec::with_capacity(steps + 1);
        prices.push(Price::new(self.initial_price));

        let normal = Normal::new(0.0, 1.0).map_err(|e| anyhow!("invalid distribution: {e}"))?;
        let dt = self.time_step;
        let drift_term = (self.drift - 0.5 * self.volatility.powi(2)) * dt;
        let vol_term = self.volatility * dt.sqrt();

        let mut current_price = self
            .initial_price
            .to_f64()
            .ok_or_else(|| anyhow!("initial price {} is not representable", self.initial_price))?;

        for _ in 0..steps {
            let z: f64 = normal.sample(&mut self.rng);
            current_price *= (drift_term + vol_term * z).exp();
            let price = Decimal::from_f64(current_price).unwrap_or(Decimal::ZERO);
            prices.push(Price::new(price));
        }

        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gbm(seed: u64) -> GeometricBrownianMotion {
        GeometricBrownianMotion::new(Decimal::ONE, 0.0, 0.8, 1.0 / 8_760.0, seed)
    }

    #[test]
    fn test_gbm_generation() {
        let path = gbm(7).generate(10).unwrap();
        assert_eq!(path.len(), 11);
        assert_eq!(path[0].value, Decimal::ONE);
        assert!(!path.iter().all(|p| p.value == Decimal::ONE));
        assert!(path.iter().all(|p| p.value > Decimal::ZERO));
    }

    #[test]
    fn test_same_seed_same_path() {
        assert_eq!(gbm(42).generate(25).unwrap(), gbm(42).generate(25).unwrap());
        assert_ne!(gbm(42).generate(25).unwrap(), gbm(43).generate(25).unwrap());
    }
}
