//! Chemical species definitions.

/// Chemical species found in natural gas streams handled by compressor trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Species {
    /// Methane (CH₄)
    CH4,
    /// Ethane (C₂H₆)
    Ethane,
    /// Propane (C₃H₈)
    Propane,
    /// n-Butane (C₄H₁₀)
    NButane,
    /// Nitrogen (N₂)
    N2,
    /// Carbon dioxide (CO₂)
    CO2,
}

/// Critical constants, acentric factor and a linear ideal-gas heat capacity fit.
///
/// `cp_ig(T) = cp_a + cp_b * T` in J/(mol·K), fitted around 250-450 K.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesData {
    /// Molar mass [kg/kmol]
    pub molar_mass: f64,
    /// Critical temperature [K]
    pub critical_temperature: f64,
    /// Critical pressure [Pa]
    pub critical_pressure: f64,
    /// Acentric factor [-]
    pub acentric_factor: f64,
    pub cp_a: f64,
    pub cp_b: f64,
}

impl Species {
    pub const ALL: [Species; 6] = [
        Species::CH4,
        Species::Ethane,
        Species::Propane,
        Species::NButane,
        Species::N2,
        Species::CO2,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Species::CH4 => "CH4",
            Species::Ethane => "Ethane",
            Species::Propane => "Propane",
            Species::NButane => "n-Butane",
            Species::N2 => "N2",
            Species::CO2 => "CO2",
        }
    }

    pub fn data(&self) -> SpeciesData {
        match self {
            Species::CH4 => SpeciesData {
                molar_mass: 16.043,
                critical_temperature: 190.56,
                critical_pressure: 45.99e5,
                acentric_factor: 0.011,
                cp_a: 19.90,
                cp_b: 0.0525,
            },
            Species::Ethane => SpeciesData {
                molar_mass: 30.070,
                critical_temperature: 305.32,
                critical_pressure: 48.72e5,
                acentric_factor: 0.099,
                cp_a: 9.40,
                cp_b: 0.1450,
            },
            Species::Propane => SpeciesData {
                molar_mass: 44.097,
                critical_temperature: 369.83,
                critical_pressure: 42.48e5,
                acentric_factor: 0.152,
                cp_a: 5.00,
                cp_b: 0.2300,
            },
            Species::NButane => SpeciesData {
                molar_mass: 58.124,
                critical_temperature: 425.12,
                critical_pressure: 37.96e5,
                acentric_factor: 0.200,
                cp_a: 9.50,
                cp_b: 0.2970,
            },
            Species::N2 => SpeciesData {
                molar_mass: 28.014,
                critical_temperature: 126.20,
                critical_pressure: 33.98e5,
                acentric_factor: 0.037,
                cp_a: 28.90,
                cp_b: 0.0007,
            },
            Species::CO2 => SpeciesData {
                molar_mass: 44.010,
                critical_temperature: 304.13,
                critical_pressure: 73.77e5,
                acentric_factor: 0.225,
                cp_a: 22.30,
                cp_b: 0.0500,
            },
        }
    }

    /// Molar mass [kg/kmol].
    pub fn molar_mass(&self) -> f64 {
        self.data().molar_mass
    }

    /// Map to the rfluids pure-fluid identifier.
    #[cfg(feature = "coolprop")]
    pub fn rfluids_pure(&self) -> rfluids::prelude::Pure {
        use rfluids::prelude::Pure;
        match self {
            Species::CH4 => Pure::Methane,
            Species::Ethane => Pure::Ethane,
            Species::Propane => Pure::nPropane,
            Species::NButane => Pure::nButane,
            Species::N2 => Pure::Nitrogen,
            Species::CO2 => Pure::CarbonDioxide,
        }
    }
}
