//! Gas composition as normalized mole fractions.

use crate::error::{FluidError, FluidResult};
use crate::species::Species;
use ct_core::numeric::{Tolerances, nearly_equal};

/// Mole fractions of a process gas, summing to one.
///
/// Repeated species are merged. The CoolProp backend takes pure gases only;
/// the virial backend mixes with Kay's rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    items: Vec<(Species, f64)>,
}

impl Composition {
    pub fn pure(species: Species) -> Self {
        Self {
            items: vec![(species, 1.0)],
        }
    }

    /// Lean dry-gas composition typical of a gas export train.
    pub fn dry_gas() -> Self {
        Self {
            items: vec![
                (Species::CH4, 0.90),
                (Species::Ethane, 0.05),
                (Species::Propane, 0.02),
                (Species::N2, 0.01),
                (Species::CO2, 0.02),
            ],
        }
    }

    /// Analysis in any consistent unit (mol%, ppm, raw counts), scaled to sum to one.
    pub fn from_analysis(analysis: &[(Species, f64)]) -> FluidResult<Self> {
        let mut items: Vec<(Species, f64)> = Vec::with_capacity(analysis.len());
        for &(species, amount) in analysis {
            if !amount.is_finite() || amount < 0.0 {
                return Err(FluidError::NonPhysical {
                    what: "gas analysis entry",
                });
            }
            match items.iter_mut().find(|(s, _)| *s == species) {
                Some((_, total)) => *total += amount,
                None => items.push((species, amount)),
            }
        }
        items.retain(|&(_, amount)| amount > 0.0);

        let total: f64 = items.iter().map(|(_, amount)| amount).sum();
        if items.is_empty() || !total.is_finite() {
            return Err(FluidError::InvalidArg {
                what: "gas analysis has no positive entries",
            });
        }
        for (_, amount) in &mut items {
            *amount /= total;
        }
        Ok(Self { items })
    }

    /// The single species when the gas is pure.
    pub fn is_pure(&self) -> Option<Species> {
        match self.items.as_slice() {
            [(species, fraction)]
                if nearly_equal(*fraction, 1.0, Tolerances { abs: 1e-10, rel: 1e-10 }) =>
            {
                Some(*species)
            }
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Species, f64)> + '_ {
        self.items.iter().copied()
    }

    /// Mixture molar mass [kg/kmol].
    pub fn molar_mass(&self) -> f64 {
        self.mole_average(|species| species.molar_mass())
    }

    /// Mole-fraction weighted sum of a per-species quantity (Kay's rule).
    pub fn mole_average(&self, f: impl Fn(Species) -> f64) -> f64 {
        self.items
            .iter()
            .map(|&(species, fraction)| f(species) * fraction)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pure_methane() {
        let gas = Composition::pure(Species::CH4);
        assert_eq!(gas.is_pure(), Some(Species::CH4));
        assert!((gas.molar_mass() - Species::CH4.molar_mass()).abs() < 1e-12);
    }

    #[test]
    fn dry_gas_is_lean_mixture() {
        let gas = Composition::dry_gas();
        assert_eq!(gas.is_pure(), None);
        let m = gas.molar_mass();
        assert!(m > 17.0 && m < 19.5, "molar mass {m}");
    }

    #[test]
    fn analysis_in_mol_percent_matches_dry_gas() {
        let gas = Composition::from_analysis(&[
            (Species::CH4, 90.0),
            (Species::Ethane, 5.0),
            (Species::Propane, 2.0),
            (Species::N2, 1.0),
            (Species::CO2, 2.0),
        ])
        .unwrap();
        assert!((gas.molar_mass() - Composition::dry_gas().molar_mass()).abs() < 1e-9);
    }

    #[test]
    fn repeated_species_merge() {
        let gas =
            Composition::from_analysis(&[(Species::CH4, 1.0), (Species::N2, 0.0), (Species::CH4, 3.0)])
                .unwrap();
        assert_eq!(gas.is_pure(), Some(Species::CH4));
    }

    #[test]
    fn bad_analysis_is_rejected() {
        assert!(Composition::from_analysis(&[]).is_err());
        assert!(Composition::from_analysis(&[(Species::CH4, 0.0)]).is_err());
        assert!(Composition::from_analysis(&[(Species::CH4, -1.0), (Species::N2, 2.0)]).is_err());
        assert!(Composition::from_analysis(&[(Species::CH4, f64::NAN)]).is_err());
    }

    proptest! {
        #[test]
        fn mixture_molar_mass_lies_between_components(
            methane in 0.01f64..100.0,
            propane in 0.01f64..100.0,
        ) {
            let gas = Composition::from_analysis(&[(Species::CH4, methane), (Species::Propane, propane)])
                .unwrap();
            let sum: f64 = gas.iter().map(|(_, f)| f).sum();
            prop_assert!((sum - 1.0).abs() < 1e-12);
            let m = gas.molar_mass();
            prop_assert!(m >= Species::CH4.molar_mass() - 1e-9);
            prop_assert!(m <= Species::Propane.molar_mass() + 1e-9);
        }
    }
}
