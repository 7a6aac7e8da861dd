//! Registry of named plant quantities.
//!
//! Every scalar the trim and linearization code touches is identified by a
//! [`Quantity`]. The registry ([`Quantity::info`]) supplies its display name,
//! unit label, category, writability and, for states, the quantity holding its
//! time derivative. [`Quantity::from_symbol`] is the factory used by
//! configuration files and the CLI.

use std::fmt;

/// Role of a quantity in a state-space model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    State,
    Control,
    Output,
}

/// Symbolic identifier of a plant scalar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quantity {
    // States
    Vt,
    Alpha,
    Beta,
    Phi,
    Theta,
    Psi,
    P,
    Q,
    R,
    Alt,
    Latitude,
    Longitude,
    Rpm(usize),
    PropPitch(usize),

    // Controls
    ThrottleCmd,
    DaCmd,
    DeCmd,
    DrCmd,
    ThrottlePos,
    DaPos,
    DePos,
    DrPos,

    // Time derivatives
    VtDot,
    AlphaDot,
    BetaDot,
    PhiDot,
    ThetaDot,
    PsiDot,
    PDot,
    QDot,
    RDot,
    AltDot,
    LatitudeDot,
    LongitudeDot,
    RpmDot(usize),

    // Environment
    Gravity,

    /// Plant-specific quantity not covered by the registry.
    Named(String),
}

/// Registry entry for a [`Quantity`].
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityInfo {
    pub symbol: String,
    pub unit: &'static str,
    pub category: Category,
    pub writable: bool,
    pub rate: Option<Quantity>,
}

const FIXED_SYMBOLS: [(&str, Quantity); 36] = [
    ("Vt", Quantity::Vt),
    ("Alpha", Quantity::Alpha),
    ("Beta", Quantity::Beta),
    ("Phi", Quantity::Phi),
    ("Theta", Quantity::Theta),
    ("Psi", Quantity::Psi),
    ("P", Quantity::P),
    ("Q", Quantity::Q),
    ("R", Quantity::R),
    ("Alt", Quantity::Alt),
    ("Latitude", Quantity::Latitude),
    ("Longitude", Quantity::Longitude),
    ("ThrottleCmd", Quantity::ThrottleCmd),
    ("DaCmd", Quantity::DaCmd),
    ("DeCmd", Quantity::DeCmd),
    ("DrCmd", Quantity::DrCmd),
    ("ThrottlePos", Quantity::ThrottlePos),
    ("DaPos", Quantity::DaPos),
    ("DePos", Quantity::DePos),
    ("DrPos", Quantity::DrPos),
    ("VtDot", Quantity::VtDot),
    ("AlphaDot", Quantity::AlphaDot),
    ("BetaDot", Quantity::BetaDot),
    ("PhiDot", Quantity::PhiDot),
    ("ThetaDot", Quantity::ThetaDot),
    ("PsiDot", Quantity::PsiDot),
    ("PDot", Quantity::PDot),
    ("QDot", Quantity::QDot),
    ("RDot", Quantity::RDot),
    ("AltDot", Quantity::AltDot),
    ("LatitudeDot", Quantity::LatitudeDot),
    ("LongitudeDot", Quantity::LongitudeDot),
    ("Gravity", Quantity::Gravity),
    ("Vtrue", Quantity::Vt),
    ("Altitude", Quantity::Alt),
    ("Throttle", Quantity::ThrottleCmd),
];

const INDEXED_PREFIXES: [&str; 3] = ["RpmDot", "Rpm", "PropPitch"];

impl Quantity {
    /// Plant-specific quantity.
    pub fn named(name: impl Into<String>) -> Self {
        Quantity::Named(name.into())
    }

    /// Look up a quantity by its symbolic identifier (`"Vt"`, `"Rpm1"`, ...).
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let symbol = symbol.trim();
        if let Some((_, q)) = FIXED_SYMBOLS.iter().find(|(s, _)| s.eq_ignore_ascii_case(symbol)) {
            return Some(q.clone());
        }
        for prefix in INDEXED_PREFIXES {
            let Some(head) = symbol.get(..prefix.len()) else {
                continue;
            };
            if !head.eq_ignore_ascii_case(prefix) {
                continue;
            }
            let Ok(index) = symbol[prefix.len()..].parse::<usize>() else {
                continue;
            };
            return Some(match prefix {
                "RpmDot" => Quantity::RpmDot(index),
                "Rpm" => Quantity::Rpm(index),
                _ => Quantity::PropPitch(index),
            });
        }
        None
    }

    /// Canonical symbol, the inverse of [`Quantity::from_symbol`].
    pub fn symbol(&self) -> String {
        match self {
            Quantity::Rpm(i) => format!("Rpm{i}"),
            Quantity::PropPitch(i) => format!("PropPitch{i}"),
            Quantity::RpmDot(i) => format!("RpmDot{i}"),
            Quantity::Named(name) => name.clone(),
            fixed => FIXED_SYMBOLS
                .iter()
                .find(|(_, q)| q == fixed)
                .map(|(s, _)| (*s).to_string())
                .unwrap_or_default(),
        }
    }

    pub fn info(&self) -> QuantityInfo {
        use Category::*;
        use Quantity::*;

        let (unit, category, writable, rate) = match self {
            Vt => ("ft/s", State, true, Some(VtDot)),
            Alpha => ("rad", State, true, Some(AlphaDot)),
            Beta => ("rad", State, true, Some(BetaDot)),
            Phi => ("rad", State, true, Some(PhiDot)),
            Theta => ("rad", State, true, Some(ThetaDot)),
            Psi => ("rad", State, true, Some(PsiDot)),
            P => ("rad/s", State, true, Some(PDot)),
            Q => ("rad/s", State, true, Some(QDot)),
            R => ("rad/s", State, true, Some(RDot)),
            Alt => ("ft", State, true, Some(AltDot)),
            Latitude => ("rad", State, true, Some(LatitudeDot)),
            Longitude => ("rad", State, true, Some(LongitudeDot)),
            Rpm(i) => ("rev/min", State, true, Some(RpmDot(*i))),
            PropPitch(_) => ("deg", State, true, None),

            ThrottleCmd | DaCmd | DeCmd | DrCmd => ("norm", Control, true, None),
            ThrottlePos | DaPos | DePos | DrPos => ("norm", Control, true, None),

            VtDot => ("ft/s^2", Output, false, None),
            AlphaDot | BetaDot | PhiDot | ThetaDot | PsiDot => ("rad/s", Output, false, None),
            PDot | QDot | RDot => ("rad/s^2", Output, false, None),
            AltDot => ("ft/s", Output, false, None),
            LatitudeDot | LongitudeDot => ("rad/s", Output, false, None),
            RpmDot(_) => ("rev/min/s", Output, false, None),

            Gravity => ("ft/s^2", Output, false, None),
            Named(_) => ("", Output, true, None),
        };

        QuantityInfo {
            symbol: self.symbol(),
            unit,
            category,
            writable,
            rate,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
