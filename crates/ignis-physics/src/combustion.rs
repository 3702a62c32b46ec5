//! Combustion product property lookup.
//!
//! Coarse three-band model: product properties change with mixture ratio
//! across fuel-rich, near-stoichiometric, and oxidizer-rich regimes.

/// Bulk properties of the combustion products.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CombustionProperties {
    /// Specific heat ratio (dimensionless)
    pub gamma: f64,
    /// Molecular weight [kg/mol]
    pub molecular_weight: f64,
    /// Adiabatic combustion temperature [K]
    pub combustion_temperature: f64,
}

/// Propellant combination the property bands are tabulated for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PropellantPair {
    /// Methane fuel with nitrous oxide oxidizer.
    #[default]
    MethaneNitrousOxide,
    /// Any combination without tabulated bands; uses a fixed default triple.
    Generic,
}

impl PropellantPair {
    /// Resolve a fuel/oxidizer name pair, case-insensitively.
    ///
    /// Unknown combinations map to [`PropellantPair::Generic`] rather than
    /// failing; the generic fallback properties are deliberately bland.
    pub fn from_names(fuel: &str, oxidizer: &str) -> Self {
        let fuel = fuel.to_ascii_lowercase();
        let oxidizer = oxidizer.to_ascii_lowercase();
        if fuel == "methane" && oxidizer == "nitrous_oxide" {
            Self::MethaneNitrousOxide
        } else {
            Self::Generic
        }
    }
}

/// Estimate combustion product properties for a propellant pair at the
/// given oxidizer-to-fuel mixture ratio.
///
/// The bands are approximate tabulated values, not an equilibrium solve.
pub fn combustion_properties(pair: PropellantPair, mixture_ratio: f64) -> CombustionProperties {
    match pair {
        PropellantPair::MethaneNitrousOxide => {
            if mixture_ratio < 2.0 {
                // Fuel-rich
                CombustionProperties {
                    gamma: 1.22,
                    molecular_weight: 0.024,
                    combustion_temperature: 2700.0,
                }
            } else if mixture_ratio <= 3.5 {
                // Near stoichiometric
                CombustionProperties {
                    gamma: 1.25,
                    molecular_weight: 0.026,
                    combustion_temperature: 3100.0,
                }
            } else {
                // Oxidizer-rich
                CombustionProperties {
                    gamma: 1.30,
                    molecular_weight: 0.028,
                    combustion_temperature: 2800.0,
                }
            }
        }
        PropellantPair::Generic => CombustionProperties {
            gamma: 1.25,
            molecular_weight: 0.026,
            combustion_temperature: 3000.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn methane_n2o_bands() {
        let rich = combustion_properties(PropellantPair::MethaneNitrousOxide, 1.5);
        let stoich = combustion_properties(PropellantPair::MethaneNitrousOxide, 2.5);
        let lean = combustion_properties(PropellantPair::MethaneNitrousOxide, 4.0);

        assert_eq!(rich.combustion_temperature, 2700.0);
        assert_eq!(stoich.combustion_temperature, 3100.0);
        assert_eq!(lean.combustion_temperature, 2800.0);

        // Hottest near stoichiometric
        assert!(stoich.combustion_temperature > rich.combustion_temperature);
        assert!(stoich.combustion_temperature > lean.combustion_temperature);
    }

    #[test]
    fn band_edges() {
        // 2.0 belongs to the near-stoichiometric band, 3.5 as well
        let at_two = combustion_properties(PropellantPair::MethaneNitrousOxide, 2.0);
        let at_three_five = combustion_properties(PropellantPair::MethaneNitrousOxide, 3.5);
        assert_eq!(at_two.gamma, 1.25);
        assert_eq!(at_three_five.gamma, 1.25);
    }

    #[test]
    fn unknown_pair_falls_back_to_generic() {
        let pair = PropellantPair::from_names("kerosene", "lox");
        assert_eq!(pair, PropellantPair::Generic);

        let props = combustion_properties(pair, 2.5);
        assert_eq!(props.combustion_temperature, 3000.0);
        assert_eq!(props.molecular_weight, 0.026);
    }

    #[test]
    fn name_lookup_is_case_insensitive() {
        assert_eq!(
            PropellantPair::from_names("Methane", "Nitrous_Oxide"),
            PropellantPair::MethaneNitrousOxide
        );
    }
}
