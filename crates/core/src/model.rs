// SPDX-License-Identifier: MIT

//! The closed set of replicated model kinds.
//!
//! Every record that participates in replication belongs to exactly one
//! [`Model`]. The registry order in [`Model::ALL`] encodes dependency
//! precedence: parent entities (e.g. a warehouse) are synced before the
//! entities that reference them (e.g. a sale), so foreign keys resolve
//! on the remote side. This is the only place inter-model ordering is
//! enforced.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// One of the fixed entity kinds eligible for replication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Model {
    SuperAdmin,
    User,
    Settings,
    Warehouse,
    Customer,
    Product,
    Sale,
    SaleItem,
    PaymentMethod,
}

impl Model {
    /// The model registry, in dependency precedence order.
    ///
    /// Replication passes iterate this array front to back.
    pub const ALL: [Model; 9] = [
        Model::SuperAdmin,
        Model::User,
        Model::Settings,
        Model::Warehouse,
        Model::Customer,
        Model::Product,
        Model::Sale,
        Model::SaleItem,
        Model::PaymentMethod,
    ];

    /// Returns the slug used in storage and as the remote endpoint path
    /// segment (`POST /sync/{slug}`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::SuperAdmin => "super-admin",
            Model::User => "user",
            Model::Settings => "settings",
            Model::Warehouse => "warehouse",
            Model::Customer => "customer",
            Model::Product => "product",
            Model::Sale => "sale",
            Model::SaleItem => "sale-item",
            Model::PaymentMethod => "payment-method",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Model {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "super-admin" => Ok(Model::SuperAdmin),
            "user" => Ok(Model::User),
            "settings" => Ok(Model::Settings),
            "warehouse" => Ok(Model::Warehouse),
            "customer" => Ok(Model::Customer),
            "product" => Ok(Model::Product),
            "sale" => Ok(Model::Sale),
            "sale-item" => Ok(Model::SaleItem),
            "payment-method" => Ok(Model::PaymentMethod),
            _ => Err(Error::UnknownModel(s.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
