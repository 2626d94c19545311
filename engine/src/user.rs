//! User record types.
//!
//! Field names on the wire follow the remote service (`catchPhrase`). Every
//! passthrough field defaults to empty so partial server responses still parse.

use crate::UserId;
use serde::{Deserialize, Deserializer, Serialize};

/// Geographic coordinates of an address, kept as the service sends them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geo {
    pub lat: String,
    pub lng: String,
}

/// Postal address. Not validated, only preserved across merges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub street: String,
    pub suite: String,
    pub city: String,
    pub zipcode: String,
    pub geo: Geo,
}

impl Address {
    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.street.is_empty()
            && self.suite.is_empty()
            && self.city.is_empty()
            && self.zipcode.is_empty()
            && self.geo.lat.is_empty()
            && self.geo.lng.is_empty()
    }
}

/// Company a user belongs to.
///
/// The service sends a full object when listing users, but echoes a bare
/// company name back from create and update. Both parse; `null` parses as
/// empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub name: String,
    pub catch_phrase: String,
    pub bs: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CompanyWire {
    Name(String),
    Full {
        #[serde(default)]
        name: String,
        #[serde(default, rename = "catchPhrase")]
        catch_phrase: String,
        #[serde(default)]
        bs: String,
    },
}

impl<'de> Deserialize<'de> for Company {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<CompanyWire>::deserialize(deserializer)? {
            None => Company::default(),
            Some(CompanyWire::Name(name)) => Company {
                name,
                ..Company::default()
            },
            Some(CompanyWire::Full {
                name,
                catch_phrase,
                bs,
            }) => Company {
                name,
                catch_phrase,
                bs,
            },
        })
    }
}

/// One directory entry.
///
/// Positive ids are issued by the remote service. Non-positive ids mark a
/// speculative record that has not been confirmed yet (see [`crate::IdPolicy`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub address: Address,
    pub company: Company,
}

impl User {
    /// Initials shown next to a user in listings, at most two characters.
    pub fn initials(&self) -> String {
        self.name
            .split(' ')
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect()
    }
}

/// The form payload submitted for a create or an update.
///
/// `company` is the company name only; the rest of [`Company`] is passthrough.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPayload {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
}

impl UserPayload {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        company: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            company: company.into(),
        }
    }

    /// Username this payload would get if the service does not supply one.
    pub fn derived_username(&self) -> String {
        derive_username(&self.name)
    }
}

impl From<&User> for UserPayload {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            company: user.company.name.clone(),
        }
    }
}

/// Lowercase form of `name` with all whitespace removed.
pub fn derive_username(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
