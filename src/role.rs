//! Tenant roles

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// A tenant category with its own permission set and navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Industry,
    ServiceVendor,
    ProductVendor,
    LogisticsVendor,
    Professional,
}

impl Role {
    /// Every role, in catalog order
    pub const ALL: [Role; 5] = [
        Role::Industry,
        Role::ServiceVendor,
        Role::ProductVendor,
        Role::LogisticsVendor,
        Role::Professional,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Industry => "industry",
            Role::ServiceVendor => "service_vendor",
            Role::ProductVendor => "product_vendor",
            Role::LogisticsVendor => "logistics_vendor",
            Role::Professional => "professional",
        }
    }

    /// Display name, reported by the service status endpoint
    pub fn label(self) -> &'static str {
        match self {
            Role::Industry => "Industry",
            Role::ServiceVendor => "Service Vendor",
            Role::ProductVendor => "Product Vendor",
            Role::LogisticsVendor => "Logistics Vendor",
            Role::Professional => "Professional",
        }
    }

    /// Position in [`Role::ALL`]; indexes per-role tables
    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| LoadError::UnknownRole(s.to_string()))
    }
}
