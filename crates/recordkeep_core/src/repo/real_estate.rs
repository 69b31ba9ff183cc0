//! Real-estate lookups.

use crate::model::real_estate::{ClientRequest, Property};
use crate::model::RecordId;
use crate::repo::Repository;
use crate::store::StoreResult;

impl Repository<'_, ClientRequest> {
    /// First request whose full name contains `surname` (case-sensitive).
    pub fn find_by_surname(&self, surname: &str) -> StoreResult<Option<ClientRequest>> {
        self.find_first(|request| request.full_name.contains(surname))
    }

    /// First request with exactly this phone number.
    pub fn find_by_phone(&self, phone_number: &str) -> StoreResult<Option<ClientRequest>> {
        self.find_first(|request| request.phone_number == phone_number)
    }
}

impl Repository<'_, Property> {
    /// Variant-formatted description of property `id`.
    pub fn describe(&self, id: RecordId) -> StoreResult<Option<String>> {
        Ok(self.get(id)?.map(|property| property.describe()))
    }
}
