use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Authorization tier of a user, derived from unit membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, poem_openapi::Enum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[oai(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "dekan")]
    Dekan,
    #[sea_orm(string_value = "wadek")]
    Wadek,
    #[sea_orm(string_value = "unit")]
    Unit,
    #[sea_orm(string_value = "sdm")]
    Sdm,
}

impl Role {
    /// Role held by users that are not assigned to any unit
    pub const UNASSIGNED: Role = Role::Sdm;

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Dekan => "dekan",
            Role::Wadek => "wadek",
            Role::Unit => "unit",
            Role::Sdm => "sdm",
        }
    }
}

/// Organizational classification of a unit, independent of its role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, poem_openapi::Enum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum UnitType {
    #[sea_orm(string_value = "wadek_i")]
    #[oai(rename = "wadek_i")]
    #[serde(rename = "wadek_i")]
    WadekOne,
    #[sea_orm(string_value = "wadek_ii")]
    #[oai(rename = "wadek_ii")]
    #[serde(rename = "wadek_ii")]
    WadekTwo,
    #[sea_orm(string_value = "unit")]
    #[oai(rename = "unit")]
    #[serde(rename = "unit")]
    Unit,
    #[sea_orm(string_value = "sdm")]
    #[oai(rename = "sdm")]
    #[serde(rename = "sdm")]
    Sdm,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::WadekOne => "wadek_i",
            UnitType::WadekTwo => "wadek_ii",
            UnitType::Unit => "unit",
            UnitType::Sdm => "sdm",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_strings_match_stored_values() {
        assert_eq!(Role::Admin.to_value(), "admin");
        assert_eq!(Role::Sdm.to_value(), Role::UNASSIGNED.as_str());
    }

    #[test]
    fn test_unit_type_serializes_with_roman_suffix() {
        assert_eq!(serde_json::to_string(&UnitType::WadekTwo).unwrap(), "\"wadek_ii\"");
        assert_eq!(UnitType::WadekOne.to_value(), "wadek_i");
    }
}
