use nalgebra::Vector3;

use crate::config::VernierGeometry;
use crate::error::ConfigError;
use super::stack::StackStatus;

// ---------------------------------------------------------------------------
// Lander definition: masses, engines, inertia
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LanderConfig {
    pub name: String,
    pub lander_empty_mass: f64,   // kg, bus + payload without AMR and retro case
    pub retro_empty_mass: f64,    // kg, spent retro case
    pub amr_mass: f64,            // kg
    pub retro_prop_mass: f64,     // kg
    pub retro_thrust: f64,        // N
    pub retro_burn_time: f64,     // s
    pub retro_station: f64,       // m along the roll axis
    pub vernier_prop_mass: f64,   // kg
    pub vernier_isp: f64,         // m/s (effective exhaust velocity)
    pub rcs_prop_mass: f64,       // kg, carried but not used by the autopilot
    pub pmi: Vector3<f64>,        // mass-normalised principal moments of inertia, m^2
    pub vernier: VernierGeometry,
}

impl LanderConfig {
    /// Effective exhaust velocity of the retro motor, m/s.
    pub fn retro_isp(&self) -> f64 {
        self.retro_thrust * self.retro_burn_time / self.retro_prop_mass
    }

    pub fn retro_mass_flow(&self) -> f64 {
        self.retro_thrust / self.retro_isp()
    }

    /// Dry mass of whatever is still attached.
    pub fn empty_mass(&self, stack: StackStatus) -> f64 {
        let mut m = self.lander_empty_mass;
        if stack.has_amr() {
            m += self.amr_mass;
        }
        if stack.has_retro() {
            m += self.retro_empty_mass;
        }
        m
    }

    /// Full mass at separation.
    pub fn total_mass(&self) -> f64 {
        self.empty_mass(StackStatus::Full) + self.retro_prop_mass + self.vernier_prop_mass + self.rcs_prop_mass
    }

    pub fn mass(&self, stack: StackStatus, retro_prop: f64, vernier_prop: f64) -> f64 {
        let retro = if stack.has_retro() { retro_prop } else { 0.0 };
        self.empty_mass(stack) + retro + vernier_prop + self.rcs_prop_mass
    }

    /// Principal moments of inertia at a given mass, kg·m^2.
    pub fn inertia(&self, mass: f64) -> Vector3<f64> {
        self.pmi * mass
    }

    /// Ideal delta-v of the retro burn from the full stack, minus the AMR.
    pub fn retro_delta_v(&self) -> f64 {
        let m0 = self.total_mass() - self.amr_mass;
        let mf = m0 - self.retro_prop_mass;
        self.retro_isp() * (m0 / mf).ln()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("lander.lander_empty_mass", self.lander_empty_mass),
            ("lander.retro_prop_mass", self.retro_prop_mass),
            ("lander.retro_thrust", self.retro_thrust),
            ("lander.retro_burn_time", self.retro_burn_time),
            ("lander.vernier_isp", self.vernier_isp),
            ("lander.pmi.x", self.pmi.x),
            ("lander.pmi.y", self.pmi.y),
            ("lander.pmi.z", self.pmi.z),
        ];
        for (field, value) in checks {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::invalid(field, format!("must be positive, got {}", value)));
            }
        }
        if self.vernier.rated_thrust <= 0.0 || self.vernier.moment_arm <= 0.0 {
            return Err(ConfigError::invalid("lander.vernier", "thrust and moment arm must be positive"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Lander builder
// ---------------------------------------------------------------------------

pub struct LanderBuilder {
    config: LanderConfig,
}

impl LanderBuilder {
    /// Starts from the Surveyor numbers.
    pub fn new(name: impl Into<String>) -> Self {
        let mut config = presets::surveyor();
        config.name = name.into();
        Self { config }
    }

    pub fn lander_empty_mass(mut self, v: f64) -> Self { self.config.lander_empty_mass = v; self }
    pub fn retro_empty_mass(mut self, v: f64) -> Self { self.config.retro_empty_mass = v; self }
    pub fn amr_mass(mut self, v: f64) -> Self { self.config.amr_mass = v; self }
    pub fn retro_prop_mass(mut self, v: f64) -> Self { self.config.retro_prop_mass = v; self }
    pub fn retro_thrust(mut self, v: f64) -> Self { self.config.retro_thrust = v; self }
    pub fn retro_burn_time(mut self, v: f64) -> Self { self.config.retro_burn_time = v; self }
    pub fn vernier_prop_mass(mut self, v: f64) -> Self { self.config.vernier_prop_mass = v; self }
    pub fn vernier_isp(mut self, v: f64) -> Self { self.config.vernier_isp = v; self }
    pub fn pmi(mut self, v: Vector3<f64>) -> Self { self.config.pmi = v; self }
    pub fn vernier(mut self, v: VernierGeometry) -> Self { self.config.vernier = v; self }

    pub fn build(self) -> Result<LanderConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ---------------------------------------------------------------------------
// Preset landers
// ---------------------------------------------------------------------------

pub mod presets {
    use super::*;

    /// Surveyor with AMR and solid retro attached.
    pub fn surveyor() -> LanderConfig {
        LanderConfig {
            name: "Surveyor".into(),
            lander_empty_mass: 289.10,
            retro_empty_mass: 64.88,
            amr_mass: 3.82,
            retro_prop_mass: 560.64,
            retro_thrust: 39_140.0,
            retro_burn_time: 40.5,
            retro_station: -0.75,
            vernier_prop_mass: 70.98,
            vernier_isp: 3200.0,
            rcs_prop_mass: 2.0,
            pmi: Vector3::new(0.5, 0.5, 0.5),
            vernier: VernierGeometry::default(),
        }
    }
}
