//! Six-degree-of-freedom rigid-body aircraft exposed through the [`Plant`] interface.
//!
//! The state is kept in wind axes (Vt, alpha, beta), Euler angles, body rates,
//! altitude and geodetic position, one RPM per engine and the actuator
//! positions. Derivatives evaluated at the start of the latest step are
//! published as the `...Dot` quantities.

use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use tl_core::constants::RADIUS_REFERENCE_FT;
use tl_plant::{Plant, PlantError, PlantResult, Quantity};

use crate::actuator::{ActuatorSet, Channel};
use crate::aero::{AeroDef, EngineDef, FlowState, ReferenceDef, Surfaces};
use crate::environment;
use crate::error::{SimError, SimResult};
use crate::integrator::IntegratorType;
use crate::mass::{MassDef, MassProperties};
use crate::model::DynamicModel;

fn default_time_step() -> f64 {
    1.0 / 120.0
}

/// Serializable aircraft definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub reference: ReferenceDef,
    pub mass: MassDef,
    pub aero: AeroDef,
    #[serde(default)]
    pub engines: Vec<EngineDef>,
    #[serde(default)]
    pub actuators: ActuatorSet,
    #[serde(default)]
    pub integrator: IntegratorType,
    #[serde(default = "default_time_step")]
    pub time_step_s: f64,
}

impl AircraftDef {
    fn invalid(&self, what: impl Into<String>) -> SimError {
        SimError::InvalidModel {
            model: self.name.clone(),
            what: what.into(),
        }
    }

    /// Check the definition and compute its mass properties.
    pub fn validate(&self) -> SimResult<MassProperties> {
        if self.name.trim().is_empty() {
            return Err(self.invalid("empty name"));
        }
        let r = &self.reference;
        if !(r.wing_area_ft2 > 0.0 && r.span_ft > 0.0 && r.chord_ft > 0.0) {
            return Err(self.invalid("reference geometry must be positive"));
        }
        for (i, e) in self.engines.iter().enumerate() {
            if !(e.max_rpm > e.idle_rpm && e.idle_rpm >= 0.0) {
                return Err(self.invalid(format!("engine {i}: max_rpm must exceed idle_rpm")));
            }
            if !(e.spool_tau_s > 0.0) {
                return Err(self.invalid(format!("engine {i}: spool_tau_s must be positive")));
            }
            if !(e.max_thrust_lbf >= 0.0) {
                return Err(self.invalid(format!("engine {i}: negative thrust")));
            }
        }
        if !(self.time_step_s > 0.0) {
            return Err(self.invalid("time_step_s must be positive"));
        }
        self.actuators
            .validate()
            .map_err(|e| self.invalid(e.to_string()))?;
        self.mass.properties().map_err(|e| self.invalid(e.to_string()))
    }
}

/// Integrated state. Also used for its time derivative.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AircraftState {
    pub vt: f64,
    pub alpha: f64,
    pub beta: f64,
    pub phi: f64,
    pub theta: f64,
    pub psi: f64,
    pub p: f64,
    pub q: f64,
    pub r: f64,
    pub alt: f64,
    pub lat: f64,
    pub lon: f64,
    pub rpm: Vec<f64>,
    /// Actuator positions indexed by [`Channel::index`].
    pub pos: [f64; 4],
}

impl AircraftState {
    fn zeros(engines: usize) -> Self {
        Self {
            rpm: vec![0.0; engines],
            ..Self::default()
        }
    }

    fn combine(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        Self {
            vt: f(self.vt, other.vt),
            alpha: f(self.alpha, other.alpha),
            beta: f(self.beta, other.beta),
            phi: f(self.phi, other.phi),
            theta: f(self.theta, other.theta),
            psi: f(self.psi, other.psi),
            p: f(self.p, other.p),
            q: f(self.q, other.q),
            r: f(self.r, other.r),
            alt: f(self.alt, other.alt),
            lat: f(self.lat, other.lat),
            lon: f(self.lon, other.lon),
            rpm: self
                .rpm
                .iter()
                .zip(&other.rpm)
                .map(|(a, b)| f(*a, *b))
                .collect(),
            pos: std::array::from_fn(|i| f(self.pos[i], other.pos[i])),
        }
    }

    fn scaled(&self, k: f64) -> Self {
        self.combine(self, |a, _| a * k)
    }

    fn scalars(&self) -> impl Iterator<Item = f64> + '_ {
        [
            self.vt, self.alpha, self.beta, self.phi, self.theta, self.psi, self.p, self.q,
            self.r, self.alt, self.lat, self.lon,
        ]
        .into_iter()
        .chain(self.rpm.iter().copied())
        .chain(self.pos)
    }

    pub fn is_finite(&self) -> bool {
        self.scalars().all(f64::is_finite)
    }

    /// Wind-axis or geodetic state slot addressed by `quantity`.
    fn slot_mut(&mut self, quantity: &Quantity) -> Option<&mut f64> {
        Some(match quantity {
            Quantity::Vt => &mut self.vt,
            Quantity::Alpha => &mut self.alpha,
            Quantity::Beta => &mut self.beta,
            Quantity::Phi => &mut self.phi,
            Quantity::Theta => &mut self.theta,
            Quantity::Psi => &mut self.psi,
            Quantity::P => &mut self.p,
            Quantity::Q => &mut self.q,
            Quantity::R => &mut self.r,
            Quantity::Alt => &mut self.alt,
            Quantity::Latitude => &mut self.lat,
            Quantity::Longitude => &mut self.lon,
            Quantity::Rpm(i) => self.rpm.get_mut(*i)?,
            _ => return None,
        })
    }

    fn slot(&self, quantity: &Quantity) -> Option<f64> {
        Some(match quantity {
            Quantity::Vt => self.vt,
            Quantity::Alpha => self.alpha,
            Quantity::Beta => self.beta,
            Quantity::Phi => self.phi,
            Quantity::Theta => self.theta,
            Quantity::Psi => self.psi,
            Quantity::P => self.p,
            Quantity::Q => self.q,
            Quantity::R => self.r,
            Quantity::Alt => self.alt,
            Quantity::Latitude => self.lat,
            Quantity::Longitude => self.lon,
            Quantity::Rpm(i) => *self.rpm.get(*i)?,
            _ => return None,
        })
    }
}

/// State whose derivative `quantity` holds.
fn state_of_rate(quantity: &Quantity) -> Option<Quantity> {
    Some(match quantity {
        Quantity::VtDot => Quantity::Vt,
        Quantity::AlphaDot => Quantity::Alpha,
        Quantity::BetaDot => Quantity::Beta,
        Quantity::PhiDot => Quantity::Phi,
        Quantity::ThetaDot => Quantity::Theta,
        Quantity::PsiDot => Quantity::Psi,
        Quantity::PDot => Quantity::P,
        Quantity::QDot => Quantity::Q,
        Quantity::RDot => Quantity::R,
        Quantity::AltDot => Quantity::Alt,
        Quantity::LatitudeDot => Quantity::Latitude,
        Quantity::LongitudeDot => Quantity::Longitude,
        Quantity::RpmDot(i) => Quantity::Rpm(*i),
        _ => return None,
    })
}

fn command_channel(quantity: &Quantity) -> Option<Channel> {
    match quantity {
        Quantity::ThrottleCmd => Some(Channel::Throttle),
        Quantity::DaCmd => Some(Channel::Aileron),
        Quantity::DeCmd => Some(Channel::Elevator),
        Quantity::DrCmd => Some(Channel::Rudder),
        _ => None,
    }
}

fn position_channel(quantity: &Quantity) -> Option<Channel> {
    match quantity {
        Quantity::ThrottlePos => Some(Channel::Throttle),
        Quantity::DaPos => Some(Channel::Aileron),
        Quantity::DePos => Some(Channel::Elevator),
        Quantity::DrPos => Some(Channel::Rudder),
        _ => None,
    }
}

/// Equations of motion for one step, with the commands held constant.
pub struct AircraftDynamics<'a> {
    def: &'a AircraftDef,
    mass: &'a MassProperties,
    commands: [f64; 4],
}

impl DynamicModel for AircraftDynamics<'_> {
    type State = AircraftState;

    fn rhs(&mut self, _t: f64, x: &AircraftState) -> SimResult<AircraftState> {
        if !(x.vt > 0.0) {
            return Err(SimError::NonPhysical {
                what: format!("true airspeed {} ft/s", x.vt),
            });
        }
        let def = self.def;
        let m = self.mass.mass_slug;

        let (sa, ca) = x.alpha.sin_cos();
        let (sb, cb) = x.beta.sin_cos();
        let (sphi, cphi) = x.phi.sin_cos();
        let (sth, cth) = x.theta.sin_cos();

        let u = x.vt * ca * cb;
        let v = x.vt * sb;
        let w = x.vt * sa * cb;

        let rho = environment::density(x.alt);
        let sigma = environment::density_ratio(x.alt);
        let g = environment::gravity(x.alt);

        let pos = |c: Channel| x.pos[c.index()];
        let fm = def.aero.forces(
            &def.reference,
            &FlowState {
                vt: x.vt,
                alpha: x.alpha,
                beta: x.beta,
                p: x.p,
                q: x.q,
                r: x.r,
                density: rho,
            },
            &Surfaces {
                aileron: pos(Channel::Aileron),
                elevator: pos(Channel::Elevator),
                rudder: pos(Channel::Rudder),
            },
        );

        let throttle = pos(Channel::Throttle);
        let thrust: f64 = def
            .engines
            .iter()
            .zip(&x.rpm)
            .map(|(e, rpm)| e.thrust(*rpm, sigma))
            .sum();
        let force = fm.force + Vector3::new(thrust, 0.0, 0.0);

        let udot = x.r * v - x.q * w + force.x / m - g * sth;
        let vdot = x.p * w - x.r * u + force.y / m + g * sphi * cth;
        let wdot = x.q * u - x.p * v + force.z / m + g * cphi * cth;

        let vt_dot = (u * udot + v * vdot + w * wdot) / x.vt;
        let beta_dot = (vdot * x.vt - v * vt_dot) / (x.vt * x.vt * cb);
        let alpha_dot = (u * wdot - w * udot) / (u * u + w * w);

        let omega = Vector3::new(x.p, x.q, x.r);
        let i = &self.mass.inertia;
        let omega_dot = self.mass.inertia_inv * (fm.moment - omega.cross(&(i * omega)));

        let phi_dot = x.p + sth / cth * (x.q * sphi + x.r * cphi);
        let theta_dot = x.q * cphi - x.r * sphi;
        let psi_dot = (x.q * sphi + x.r * cphi) / cth;

        let ned = Rotation3::from_euler_angles(x.phi, x.theta, x.psi) * Vector3::new(u, v, w);
        let radius = RADIUS_REFERENCE_FT + x.alt;

        Ok(AircraftState {
            vt: vt_dot,
            alpha: alpha_dot,
            beta: beta_dot,
            phi: phi_dot,
            theta: theta_dot,
            psi: psi_dot,
            p: omega_dot.x,
            q: omega_dot.y,
            r: omega_dot.z,
            alt: -ned.z,
            lat: ned.x / radius,
            lon: ned.y / (radius * x.lat.cos()),
            rpm: def
                .engines
                .iter()
                .zip(&x.rpm)
                .map(|(e, rpm)| e.rpm_dot(*rpm, throttle))
                .collect(),
            pos: std::array::from_fn(|k| {
                let c = Channel::ALL[k];
                def.actuators.dpdt(c, x.pos[k], c.clamp(self.commands[k]))
            }),
        })
    }

    fn add(&self, a: &AircraftState, b: &AircraftState) -> AircraftState {
        a.combine(b, |x, y| x + y)
    }

    fn scale(&self, a: &AircraftState, scale: f64) -> AircraftState {
        a.scaled(scale)
    }
}

/// Aircraft plant built from an [`AircraftDef`].
#[derive(Debug, Clone)]
pub struct Aircraft {
    def: AircraftDef,
    mass: MassProperties,
    state: AircraftState,
    derivative: AircraftState,
    commands: [f64; 4],
    dt: f64,
    time: f64,
}

impl Aircraft {
    pub fn new(def: AircraftDef) -> SimResult<Self> {
        let mass = def.validate()?;
        let engines = def.engines.len();
        let mut state = AircraftState::zeros(engines);
        for (rpm, e) in state.rpm.iter_mut().zip(&def.engines) {
            *rpm = e.idle_rpm;
        }
        tracing::debug!(
            model = %def.name,
            weight_lb = mass.weight_lb,
            engines,
            "aircraft built"
        );
        Ok(Self {
            dt: def.time_step_s,
            def,
            mass,
            state,
            derivative: AircraftState::zeros(engines),
            commands: [0.0; 4],
            time: 0.0,
        })
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn def(&self) -> &AircraftDef {
        &self.def
    }

    pub fn mass_properties(&self) -> &MassProperties {
        &self.mass
    }

    pub fn state(&self) -> &AircraftState {
        &self.state
    }

    /// Derivative evaluated at the start of the latest step (or settle).
    pub fn derivative(&self) -> &AircraftState {
        &self.derivative
    }

    pub fn engine_count(&self) -> usize {
        self.def.engines.len()
    }

    fn dynamics(&self) -> AircraftDynamics<'_> {
        AircraftDynamics {
            def: &self.def,
            mass: &self.mass,
            commands: self.commands,
        }
    }

    /// Channels without an actuator follow their command directly.
    fn sync_positions(&mut self) {
        for c in Channel::ALL {
            if self.def.actuators.get(c).is_none() {
                self.state.pos[c.index()] = c.clamp(self.commands[c.index()]);
            }
        }
    }

    fn refresh_derivative(&mut self) -> SimResult<()> {
        let d = self.dynamics().rhs(self.time, &self.state)?;
        self.derivative = d;
        Ok(())
    }

    fn unknown(quantity: &Quantity) -> PlantError {
        PlantError::UnknownQuantity {
            name: quantity.symbol(),
        }
    }
}

impl Plant for Aircraft {
    fn set_time_step(&mut self, dt: f64) {
        self.dt = dt;
    }

    fn time_step(&self) -> f64 {
        self.dt
    }

    fn run_one_step(&mut self) -> PlantResult<()> {
        self.sync_positions();
        let (derivative, next) = {
            let mut dynamics = self.dynamics();
            let d = dynamics.rhs(self.time, &self.state)?;
            let n = self
                .def
                .integrator
                .step(&mut dynamics, self.time, &self.state, self.dt)?;
            (d, n)
        };
        if !next.is_finite() {
            tracing::debug!(model = %self.def.name, t = self.time, "non-finite state");
            return Err(PlantError::Diverged {
                what: format!("{} state at t = {}", self.def.name, self.time),
            });
        }
        self.derivative = derivative;
        self.state = next;
        self.time += self.dt;
        Ok(())
    }

    fn get(&self, quantity: &Quantity) -> PlantResult<f64> {
        if let Some(v) = self.state.slot(quantity) {
            return Ok(v);
        }
        if let Some(c) = command_channel(quantity) {
            return Ok(self.commands[c.index()]);
        }
        if let Some(c) = position_channel(quantity) {
            return Ok(self.state.pos[c.index()]);
        }
        if let Some(s) = state_of_rate(quantity) {
            return self.derivative.slot(&s).ok_or_else(|| Self::unknown(quantity));
        }
        match quantity {
            Quantity::Gravity => Ok(environment::gravity(self.state.alt)),
            _ => Err(Self::unknown(quantity)),
        }
    }

    fn set(&mut self, quantity: &Quantity, value: f64) -> PlantResult<()> {
        if let Some(slot) = self.state.slot_mut(quantity) {
            *slot = value;
            return Ok(());
        }
        if let Some(c) = command_channel(quantity) {
            self.commands[c.index()] = value;
            if self.def.actuators.get(c).is_none() {
                self.state.pos[c.index()] = c.clamp(value);
            }
            return Ok(());
        }
        if let Some(c) = position_channel(quantity) {
            self.state.pos[c.index()] = value;
            return Ok(());
        }
        if state_of_rate(quantity).is_some_and(|s| self.state.slot(&s).is_some())
            || *quantity == Quantity::Gravity
        {
            return Err(PlantError::ReadOnly {
                name: quantity.symbol(),
            });
        }
        Err(Self::unknown(quantity))
    }

    fn settle(&mut self) -> PlantResult<()> {
        for c in Channel::ALL {
            self.state.pos[c.index()] = c.clamp(self.commands[c.index()]);
        }
        let throttle = self.state.pos[Channel::Throttle.index()];
        for (rpm, e) in self.state.rpm.iter_mut().zip(&self.def.engines) {
            *rpm = e.steady_rpm(throttle);
        }
        self.refresh_derivative()?;
        Ok(())
    }

    fn sim_time(&self) -> f64 {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::FirstOrderActuator;
    use crate::aero::LiftDef;
    use crate::mass::InertiaDef;
    use tl_core::constants::SLUG_TO_LB;

    /// Lifting body without drag or pitching moment.
    fn glider() -> AircraftDef {
        AircraftDef {
            name: "glider".into(),
            description: String::new(),
            reference: ReferenceDef {
                wing_area_ft2: 100.0,
                span_ft: 30.0,
                chord_ft: 3.5,
            },
            mass: MassDef {
                empty_weight_lb: SLUG_TO_LB * 50.0,
                empty_cg_ft: [0.0; 3],
                empty_inertia_slug_ft2: InertiaDef {
                    ixx: 1000.0,
                    iyy: 1500.0,
                    izz: 2200.0,
                    ixy: 0.0,
                    ixz: 0.0,
                    iyz: 0.0,
                },
                point_masses: Vec::new(),
            },
            aero: AeroDef {
                lift: LiftDef {
                    alpha: 5.0,
                    ..LiftDef::default()
                },
                ..AeroDef::default()
            },
            engines: vec![EngineDef {
                max_thrust_lbf: 1000.0,
                idle_rpm: 600.0,
                max_rpm: 2600.0,
                spool_tau_s: 0.5,
            }],
            actuators: ActuatorSet::default(),
            integrator: IntegratorType::Rk4,
            time_step_s: 0.01,
        }
    }

    fn flying(def: AircraftDef) -> Aircraft {
        let mut ac = Aircraft::new(def).unwrap();
        ac.set(&Quantity::Vt, 200.0).unwrap();
        ac.set(&Quantity::Alt, 1000.0).unwrap();
        ac
    }

    #[test]
    fn zero_lift_accelerates_at_gravity() {
        let mut ac = flying(glider());
        ac.settle().unwrap();
        ac.run_one_step().unwrap();
        // alpha = 0, no lift and no thrust at idle: vertical speed builds at g
        let g = ac.get(&Quantity::Gravity).unwrap();
        let alpha_dot = ac.get(&Quantity::AlphaDot).unwrap();
        assert!((alpha_dot - g / 200.0).abs() < 1e-9, "alpha_dot = {alpha_dot}");
        assert_eq!(ac.get(&Quantity::VtDot).unwrap(), 0.0);
        assert_eq!(ac.get(&Quantity::AltDot).unwrap(), 0.0);
        assert!(ac.get(&Quantity::Alpha).unwrap() > 0.0);
        assert!((ac.sim_time() - 0.01).abs() < 1e-15);
    }

    #[test]
    fn level_climb_rate_follows_flight_path() {
        let mut ac = flying(glider());
        ac.set(&Quantity::Theta, 0.1).unwrap();
        ac.settle().unwrap();
        let h_dot = ac.get(&Quantity::AltDot).unwrap();
        assert!((h_dot - 200.0 * 0.1_f64.sin()).abs() < 1e-9);
    }

    #[test]
    fn settle_spools_engine_to_steady_state() {
        let mut ac = flying(glider());
        ac.set(&Quantity::ThrottleCmd, 0.5).unwrap();
        assert_eq!(ac.get(&Quantity::Rpm(0)).unwrap(), 600.0);
        ac.settle().unwrap();
        assert_eq!(ac.get(&Quantity::Rpm(0)).unwrap(), 1600.0);
        assert_eq!(ac.get(&Quantity::RpmDot(0)).unwrap(), 0.0);
        // half of max thrust on 50 slug
        assert!(ac.get(&Quantity::VtDot).unwrap() > 0.0);
    }

    #[test]
    fn positions_follow_commands_without_actuators() {
        let mut ac = flying(glider());
        ac.set(&Quantity::DeCmd, 0.3).unwrap();
        assert_eq!(ac.get(&Quantity::DePos).unwrap(), 0.3);
        ac.set(&Quantity::DeCmd, 3.0).unwrap();
        assert_eq!(ac.get(&Quantity::DePos).unwrap(), 1.0);
        assert_eq!(ac.get(&Quantity::DeCmd).unwrap(), 3.0);
    }

    #[test]
    fn actuator_lags_command() {
        let mut def = glider();
        def.actuators.elevator = Some(FirstOrderActuator::new(0.1, 10.0).unwrap());
        let mut ac = flying(def);
        ac.set(&Quantity::DeCmd, 0.2).unwrap();
        assert_eq!(ac.get(&Quantity::DePos).unwrap(), 0.0);
        ac.run_one_step().unwrap();
        let pos = ac.get(&Quantity::DePos).unwrap();
        assert!(pos > 0.0 && pos < 0.2, "pos = {pos}");
        ac.settle().unwrap();
        assert_eq!(ac.get(&Quantity::DePos).unwrap(), 0.2);
    }

    #[test]
    fn steady_roll_rate_is_held() {
        let mut ac = flying(glider());
        ac.set(&Quantity::P, 0.2).unwrap();
        ac.settle().unwrap();
        // principal axes and no aerodynamic roll moment
        assert!(ac.get(&Quantity::PDot).unwrap().abs() < 1e-12);
        assert!((ac.get(&Quantity::PhiDot).unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn read_only_and_unknown_quantities() {
        let mut ac = flying(glider());
        assert!(matches!(
            ac.set(&Quantity::VtDot, 1.0),
            Err(PlantError::ReadOnly { .. })
        ));
        assert!(matches!(
            ac.set(&Quantity::Gravity, 1.0),
            Err(PlantError::ReadOnly { .. })
        ));
        assert!(matches!(
            ac.get(&Quantity::Rpm(1)),
            Err(PlantError::UnknownQuantity { .. })
        ));
        assert!(!ac.has(&Quantity::PropPitch(0)));
        assert!(!ac.has(&Quantity::named("flaps")));
        assert!(ac.has(&Quantity::RpmDot(0)));
    }

    #[test]
    fn zero_airspeed_diverges() {
        let mut ac = Aircraft::new(glider()).unwrap();
        let before = ac.state().clone();
        assert!(matches!(
            ac.run_one_step(),
            Err(PlantError::Diverged { .. })
        ));
        assert_eq!(ac.state(), &before);
        assert_eq!(ac.sim_time(), 0.0);
    }

    #[test]
    fn invalid_definition_is_rejected() {
        let mut def = glider();
        def.engines[0].max_rpm = 500.0;
        assert!(matches!(
            Aircraft::new(def),
            Err(SimError::InvalidModel { .. })
        ));

        let mut def = glider();
        def.reference.chord_ft = 0.0;
        assert!(Aircraft::new(def).is_err());
    }
}
