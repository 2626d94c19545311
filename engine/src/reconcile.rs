//! Reconciliation policy for optimistic mutations.
//!
//! Every function here is pure: it takes the current collection (or single
//! records) and returns a new value. The coordinator composes them inside
//! [`crate::RecordStore::replace`] so each step is a read-modify-write against
//! the current store rather than a stale copy.
//!
//! # Field precedence
//!
//! | field                        | create                  | update                    |
//! |------------------------------|-------------------------|---------------------------|
//! | `id`                         | confirmed               | existing                  |
//! | `name`, `email`              | confirmed, else payload | confirmed, else payload   |
//! | `phone`, `company.name`      | payload                 | payload                   |
//! | `username`, `website`        | confirmed, else temp    | existing, else confirmed  |
//! | `address`                    | confirmed, else temp    | existing, else confirmed  |
//! | `company.catchPhrase`, `bs`  | confirmed, else temp    | existing, else confirmed  |
//!
//! "else" falls through on empty values only. Anything that is still empty at
//! the end of its chain stays empty.

use crate::{derive_username, Address, Company, IdPolicy, User, UserId, UserPayload};

/// Build the speculative record inserted when a create starts.
pub fn speculative_user(temp_id: UserId, payload: &UserPayload) -> User {
    User {
        id: temp_id,
        name: payload.name.clone(),
        username: payload.derived_username(),
        email: payload.email.clone(),
        phone: payload.phone.clone(),
        website: String::new(),
        address: Address::default(),
        company: Company {
            name: payload.company.clone(),
            ..Company::default()
        },
    }
}

/// Apply an update payload to a record in place: same id, payload fields
/// overwrite name, email, phone and company name, everything else untouched.
pub fn apply_patch(existing: &User, payload: &UserPayload) -> User {
    let mut patched = existing.clone();
    patched.name = payload.name.clone();
    patched.email = payload.email.clone();
    patched.phone = payload.phone.clone();
    patched.company.name = payload.company.clone();
    patched
}

/// Merge the service's answer to a create with the speculative record it
/// replaces.
pub fn merge_create(temp: &User, confirmed: &User, payload: &UserPayload) -> User {
    User {
        id: confirmed.id,
        name: prefer(&confirmed.name, &payload.name),
        email: prefer(&confirmed.email, &payload.email),
        phone: payload.phone.clone(),
        username: prefer(&confirmed.username, &temp.username),
        website: prefer(&confirmed.website, &temp.website),
        address: prefer_address(&confirmed.address, &temp.address),
        company: Company {
            name: payload.company.clone(),
            catch_phrase: prefer(&confirmed.company.catch_phrase, &temp.company.catch_phrase),
            bs: prefer(&confirmed.company.bs, &temp.company.bs),
        },
    }
}

/// Merge the service's answer to an update (or a locally synthesized stand-in
/// for it) with the record currently in the store.
pub fn merge_update(existing: &User, confirmed: &User, payload: &UserPayload) -> User {
    User {
        id: existing.id,
        name: prefer(&confirmed.name, &payload.name),
        email: prefer(&confirmed.email, &payload.email),
        phone: payload.phone.clone(),
        username: prefer(&existing.username, &confirmed.username),
        website: prefer(&existing.website, &confirmed.website),
        address: prefer_address(&existing.address, &confirmed.address),
        company: Company {
            name: payload.company.clone(),
            catch_phrase: prefer(&existing.company.catch_phrase, &confirmed.company.catch_phrase),
            bs: prefer(&existing.company.bs, &confirmed.company.bs),
        },
    }
}

/// Drop every record that shares `candidate`'s id, email or username, so
/// `candidate` can be inserted without creating a duplicate entry.
pub fn dedupe(users: &[User], candidate: &User) -> Vec<User> {
    users
        .iter()
        .filter(|u| !same_logical_record(u, candidate))
        .cloned()
        .collect()
}

/// Find the confirmed id of the record a payload describes, matching on
/// email or on the username derived from the payload's name.
///
/// Speculative records never match: the point is to find the id the service
/// knows the record by.
pub fn resolve_temp_id(users: &[User], payload: &UserPayload, policy: &IdPolicy) -> Option<UserId> {
    let username = payload.derived_username();
    users
        .iter()
        .filter(|u| !policy.is_speculative(u.id))
        .find(|u| {
            (!payload.email.is_empty() && u.email == payload.email)
                || (!username.is_empty() && u.username == username)
        })
        .map(|u| u.id)
}

/// Replace the speculative record `temp_id` with `merged`, keeping its
/// position.
///
/// If the speculative record is no longer in the collection, `merged` is
/// deduplicated and prepended instead. In both cases any other record that
/// already holds `merged.id` is evicted.
pub fn swap_in(users: &[User], temp_id: UserId, merged: &User) -> Vec<User> {
    if users.iter().any(|u| u.id == temp_id) {
        users
            .iter()
            .filter(|u| u.id == temp_id || u.id != merged.id)
            .map(|u| if u.id == temp_id { merged.clone() } else { u.clone() })
            .collect()
    } else {
        prepend(&dedupe(users, merged), merged)
    }
}

/// Replace the record with `merged.id` in place. A record that has since left
/// the collection is not brought back.
pub fn upsert(users: &[User], merged: &User) -> Vec<User> {
    users
        .iter()
        .map(|u| if u.id == merged.id { merged.clone() } else { u.clone() })
        .collect()
}

/// `user` followed by `users`.
pub fn prepend(users: &[User], user: &User) -> Vec<User> {
    let mut next = Vec::with_capacity(users.len() + 1);
    next.push(user.clone());
    next.extend_from_slice(users);
    next
}

/// `users` without the record `id`.
pub fn without(users: &[User], id: UserId) -> Vec<User> {
    users.iter().filter(|u| u.id != id).cloned().collect()
}

fn same_logical_record(existing: &User, candidate: &User) -> bool {
    existing.id == candidate.id
        || (!candidate.email.is_empty() && existing.email == candidate.email)
        || (!candidate.username.is_empty() && existing.username == candidate.username)
}

fn prefer(first: &str, fallback: &str) -> String {
    if first.is_empty() {
        fallback.to_string()
    } else {
        first.to_string()
    }
}

fn prefer_address(first: &Address, fallback: &Address) -> Address {
    if first.is_empty() {
        fallback.clone()
    } else {
        first.clone()
    }
}
