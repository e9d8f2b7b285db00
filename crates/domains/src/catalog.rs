//! Fixed enumerations: actor roles, event categories and areas.
//!
//! Categories and areas are serialized with their display labels because
//! those labels are what the public filter query string carries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Privilege level of an authenticated actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Poster,
    Admin,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Poster, Role::Admin, Role::SuperAdmin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Poster => "poster",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    /// `admin` or `super_admin`.
    pub fn has_elevated_privileges(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    /// The highest privilege level.
    pub fn is_super(self) -> bool {
        self == Role::SuperAdmin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown role: {s}")))
    }
}

macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label() == s)
                    .ok_or_else(|| DomainError::validation(
                        format!(concat!("unknown ", stringify!($name), ": {}"), s)
                    ))
            }
        }
    };
}

labelled_enum! {
    /// Event category shown as a badge and used as an exact-match filter.
    Category {
        Festival => "祭り・縁日",
        MusicLive => "音楽・ライブ",
        Sports => "スポーツ・運動",
        Learning => "学び・講座",
        Kids => "子育て・キッズ",
        FoodMarket => "食・マルシェ",
        ArtExhibition => "アート・展示",
        Volunteer => "ボランティア",
        Other => "その他",
    }
}

labelled_enum! {
    /// Ward / district the event takes place in.
    Area {
        ChuoNaka => "中央区（旧中区）",
        ChuoHigashi => "中央区（旧東区）",
        ChuoNishi => "中央区（旧西区）",
        ChuoMinami => "中央区（旧南区）",
        ChuoKita => "中央区（旧北区・三方原）",
        HamanaHamakita => "浜名区（旧浜北区）",
        HamanaKita => "浜名区（旧北区）",
        Tenryu => "天竜区（旧天竜区）",
    }
}

/// Tag whose presence marks an event as going ahead in the rain.
pub const RAIN_OK_TAG: &str = "雨でもOK";
