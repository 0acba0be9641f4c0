//! A table-scoped view over the client.

use crate::{
    AirtableClient, Criteria, Error, Fields, Record, SearchSpec, Transport, UreqTransport,
    record::DeletedRecord,
};

/// An [AirtableClient] bound to a single table. Every method delegates to
/// the client method of the same name.
#[derive(Debug)]
pub struct TableManipulator<'a, T = UreqTransport> {
    client: &'a AirtableClient<T>,
    table: &'a str,
}

impl<T> Clone for TableManipulator<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TableManipulator<'_, T> {}

impl<'a, T: Transport> TableManipulator<'a, T> {
    /// Bind `client` to `table`.
    pub fn new(client: &'a AirtableClient<T>, table: &'a str) -> Self {
        Self { client, table }
    }

    /// The table this view is bound to.
    pub fn name(&self) -> &str {
        self.table
    }

    /// See [AirtableClient::create_record].
    pub fn create_record(&self, fields: &Fields) -> Result<Record, Error> {
        self.client.create_record(self.table, fields)
    }

    /// See [AirtableClient::create_records].
    pub fn create_records(&self, records: &[Fields]) -> Result<Vec<Record>, Error> {
        self.client.create_records(self.table, records)
    }

    /// See [AirtableClient::get_record].
    pub fn get_record(&self, id: &str) -> Result<Record, Error> {
        self.client.get_record(self.table, id)
    }

    /// See [AirtableClient::find_records].
    pub fn find_records(&self, criteria: &Criteria) -> Result<Vec<Record>, Error> {
        self.client.find_records(self.table, criteria)
    }

    /// See [AirtableClient::find_records_by_formula].
    pub fn find_records_by_formula(
        &self,
        formula: &str,
        view: Option<&str>,
    ) -> Result<Vec<Record>, Error> {
        self.client.find_records_by_formula(self.table, formula, view)
    }

    /// See [AirtableClient::find_record].
    pub fn find_record(&self, criteria: &Criteria) -> Result<Option<Record>, Error> {
        self.client.find_record(self.table, criteria)
    }

    /// See [AirtableClient::contains_record].
    pub fn contains_record(&self, criteria: &Criteria) -> Result<bool, Error> {
        self.client.contains_record(self.table, criteria)
    }

    /// See [AirtableClient::set_record].
    pub fn set_record(&self, criteria: &Criteria, fields: &Fields) -> Result<Record, Error> {
        self.client.set_record(self.table, criteria, fields)
    }

    /// See [AirtableClient::update_record].
    pub fn update_record(&self, criteria: &Criteria, fields: &Fields) -> Result<Record, Error> {
        self.client.update_record(self.table, criteria, fields)
    }

    /// See [AirtableClient::update_record_by_id].
    pub fn update_record_by_id(&self, id: &str, fields: &Fields) -> Result<Record, Error> {
        self.client.update_record_by_id(self.table, id, fields)
    }

    /// See [AirtableClient::delete_record].
    pub fn delete_record(&self, criteria: &Criteria) -> Result<DeletedRecord, Error> {
        self.client.delete_record(self.table, criteria)
    }

    /// See [AirtableClient::delete_records].
    pub fn delete_records(&self, criteria: &Criteria) -> Result<(), Error> {
        self.client.delete_records(self.table, criteria)
    }

    /// See [AirtableClient::flush_records].
    pub fn flush_records(&self) -> Result<(), Error> {
        self.client.flush_records(self.table)
    }

    /// See [AirtableClient::search_records].
    pub fn search_records(&self, spec: &SearchSpec) -> Result<Vec<Record>, Error> {
        self.client.search_records(self.table, spec)
    }
}
