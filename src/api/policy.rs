//! Record ownership checks shared by every protected resource.

use crate::api::error::ServiceError;
use crate::db::models::ApplicationRow;

/// A record that belongs to exactly one user
pub trait Owned {
    fn owner_id(&self) -> i64;
}

impl Owned for ApplicationRow {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

pub fn owns<T: Owned + ?Sized>(user_id: i64, record: &T) -> bool {
    record.owner_id() == user_id
}

/// Pass the record through if `user_id` owns it, otherwise `Forbidden`
pub fn authorize<T: Owned>(user_id: i64, record: T) -> Result<T, ServiceError> {
    if owns(user_id, &record) {
        Ok(record)
    } else {
        Err(ServiceError::Forbidden)
    }
}
