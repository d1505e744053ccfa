// ct-core/src/units.rs

use uom::si::f64::{
    MassDensity as UomMassDensity, MassRate as UomMassRate, Power as UomPower,
    Pressure as UomPressure, ThermodynamicTemperature as UomThermodynamicTemperature,
};

// Public canonical unit types (SI, f64)
pub type Density = UomMassDensity;
pub type MassRate = UomMassRate;
pub type Power = UomPower;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn bara(v: f64) -> Pressure {
    use uom::si::pressure::bar;
    Pressure::new::<bar>(v)
}

#[inline]
pub fn to_bara(p: Pressure) -> f64 {
    use uom::si::pressure::bar;
    p.get::<bar>()
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn kgps(v: f64) -> MassRate {
    use uom::si::mass_rate::kilogram_per_second;
    MassRate::new::<kilogram_per_second>(v)
}

#[inline]
pub fn kg_per_m3(v: f64) -> Density {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    Density::new::<kilogram_per_cubic_meter>(v)
}

#[inline]
pub fn watt(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

pub mod constants {
    /// Universal gas constant [J/(kmol·K)]
    pub const R_UNIVERSAL: f64 = 8314.462_618;

    /// Standard temperature for gas volumes: 15 °C [K]
    pub const STANDARD_TEMPERATURE_K: f64 = 288.15;

    /// Standard pressure for gas volumes [Pa]
    pub const STANDARD_PRESSURE_PA: f64 = 101_325.0;

    /// Ideal-gas molar volume at standard conditions [m³/kmol]
    pub const STANDARD_MOLAR_VOLUME_M3_PER_KMOL: f64 =
        R_UNIVERSAL * STANDARD_TEMPERATURE_K / STANDARD_PRESSURE_PA;

    pub const SECONDS_PER_DAY: f64 = 86_400.0;
    pub const SECONDS_PER_HOUR: f64 = 3_600.0;

    /// Density of gas at standard conditions [kg/Sm³] for a molar mass [kg/kmol].
    #[inline]
    pub fn standard_density(molar_mass_kg_per_kmol: f64) -> f64 {
        molar_mass_kg_per_kmol / STANDARD_MOLAR_VOLUME_M3_PER_KMOL
    }
}
