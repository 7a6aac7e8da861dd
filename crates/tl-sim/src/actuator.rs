//! Control surface and throttle actuators with first-order dynamics and rate limiting.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Control channel driven by a command / position pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Throttle,
    Aileron,
    Elevator,
    Rudder,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Throttle,
        Channel::Aileron,
        Channel::Elevator,
        Channel::Rudder,
    ];

    pub fn index(self) -> usize {
        match self {
            Channel::Throttle => 0,
            Channel::Aileron => 1,
            Channel::Elevator => 2,
            Channel::Rudder => 3,
        }
    }

    /// Normalized travel of the channel.
    pub fn range(self) -> (f64, f64) {
        match self {
            Channel::Throttle => (0.0, 1.0),
            _ => (-1.0, 1.0),
        }
    }

    pub fn clamp(self, v: f64) -> f64 {
        let (lo, hi) = self.range();
        v.clamp(lo, hi)
    }
}

/// First-order actuator with rate limiting.
///
/// Dynamics: dpos/dt = (1/tau) * (cmd - pos), clamped to [-rate_limit, rate_limit].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FirstOrderActuator {
    /// Time constant (seconds)
    pub tau_s: f64,
    /// Rate limit (travel per second), must be positive
    pub rate_limit_per_s: f64,
}

impl FirstOrderActuator {
    pub fn new(tau_s: f64, rate_limit_per_s: f64) -> SimResult<Self> {
        let act = Self {
            tau_s,
            rate_limit_per_s,
        };
        act.validate()?;
        Ok(act)
    }

    pub fn validate(&self) -> SimResult<()> {
        if !(self.tau_s > 0.0) {
            return Err(SimError::InvalidArg {
                what: "actuator tau must be positive",
            });
        }
        if !(self.rate_limit_per_s > 0.0) {
            return Err(SimError::InvalidArg {
                what: "actuator rate limit must be positive",
            });
        }
        Ok(())
    }

    /// Compute position derivative given current position and command.
    pub fn dpdt(&self, position: f64, command: f64) -> f64 {
        let raw = (command - position) / self.tau_s;
        raw.clamp(-self.rate_limit_per_s, self.rate_limit_per_s)
    }
}

/// Optional actuator per control channel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuatorSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle: Option<FirstOrderActuator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aileron: Option<FirstOrderActuator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevator: Option<FirstOrderActuator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rudder: Option<FirstOrderActuator>,
}

impl ActuatorSet {
    pub fn get(&self, channel: Channel) -> Option<&FirstOrderActuator> {
        match channel {
            Channel::Throttle => self.throttle.as_ref(),
            Channel::Aileron => self.aileron.as_ref(),
            Channel::Elevator => self.elevator.as_ref(),
            Channel::Rudder => self.rudder.as_ref(),
        }
    }

    /// True when any channel lags its command.
    pub fn any(&self) -> bool {
        Channel::ALL.iter().any(|c| self.get(*c).is_some())
    }

    pub fn validate(&self) -> SimResult<()> {
        for c in Channel::ALL {
            if let Some(act) = self.get(c) {
                act.validate()?;
            }
        }
        Ok(())
    }

    /// Position rate of `channel`; zero for channels without lag.
    pub fn dpdt(&self, channel: Channel, position: f64, command: f64) -> f64 {
        self.get(channel)
            .map(|a| a.dpdt(position, command))
            .unwrap_or(0.0)
    }
}
