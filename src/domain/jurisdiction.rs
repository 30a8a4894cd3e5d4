use crate::utils::error::LookupError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! jurisdictions {
    ($($variant:ident),+ $(,)?) => {
        /// 支援查詢的州 / 領地代碼
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Jurisdiction {
            $($variant),+
        }

        impl Jurisdiction {
            /// 固定的查詢順序，批次結果依此排列
            pub const ALL: &'static [Jurisdiction] = &[$(Jurisdiction::$variant),+];

            pub fn code(&self) -> &'static str {
                match self {
                    $(Jurisdiction::$variant => stringify!($variant)),+
                }
            }
        }

        impl FromStr for Jurisdiction {
            type Err = LookupError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $(stringify!($variant) => Ok(Jurisdiction::$variant),)+
                    other => Err(LookupError::ValidationError {
                        message: format!("Unsupported jurisdiction: {}", other),
                    }),
                }
            }
        }
    };
}

jurisdictions!(
    AL, AK, AZ, AR, CT, DE, DC, GU, HI, ID, IL, IA, KS, MD, MA, MI, MN, MO, MT, NE, NH, NJ, NM,
    NC, ND, OK, OR, RI, SC, TN, VT, VA, WV, WI,
);

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for Jurisdiction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Jurisdiction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}
