//! In-memory DNS provider for local development and tests

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;

use super::{CreateOutcome, DnsProvider, ManagedZone, RecordType, ZoneRecord};
use crate::resolver::TxtResolver;
use crate::{Error, Result};

/// A DNS provider backed by process memory
///
/// Zones are seeded up front; records can be created through the normal
/// provider surface. Useful for exercising the verification flow without
/// touching a real DNS account.
///
/// The provider is also a [`TxtResolver`] over its own records, so a
/// local-development gate can resolve the probe records it creates instead
/// of querying real DNS for names that exist nowhere else.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    zones: DashMap<String, ZoneEntry>,
}

#[derive(Debug)]
struct ZoneEntry {
    zone: ManagedZone,
    records: Vec<ZoneRecord>,
}

impl MemoryProvider {
    /// Create an empty provider with no zones
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a hosted zone, returning the provider for chaining
    pub fn with_zone(self, name: impl Into<String>) -> Self {
        self.add_zone(name);
        self
    }

    /// Seed a hosted zone
    pub fn add_zone(&self, name: impl Into<String>) {
        let name = name.into();
        let id = format!("zone-{}", name.replace('.', "-"));
        self.zones.insert(
            name.clone(),
            ZoneEntry {
                zone: ManagedZone { id, name },
                records: Vec::new(),
            },
        );
    }

    /// Seed a record directly, bypassing the create path (test setup)
    pub fn add_record(&self, zone_name: &str, record: ZoneRecord) -> Result<()> {
        let mut entry = self
            .zones
            .get_mut(zone_name)
            .ok_or_else(|| Error::zone_not_found(zone_name))?;
        entry.records.push(record);
        Ok(())
    }
}

#[async_trait]
impl DnsProvider for MemoryProvider {
    async fn find_zone(&self, name: &str) -> Result<Option<ManagedZone>> {
        Ok(self.zones.get(name).map(|entry| entry.zone.clone()))
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<ZoneRecord>> {
        for entry in self.zones.iter() {
            if entry.zone.id == zone_id {
                return Ok(entry.records.clone());
            }
        }
        Err(Error::provider(format!("no zone with id {zone_id}")))
    }

    async fn create_record(&self, zone_id: &str, record: &ZoneRecord) -> Result<CreateOutcome> {
        for mut entry in self.zones.iter_mut() {
            if entry.zone.id != zone_id {
                continue;
            }
            let duplicate = entry
                .records
                .iter()
                .any(|r| r.name == record.name && r.record_type == record.record_type);
            if duplicate {
                return Ok(CreateOutcome::AlreadyExists);
            }
            entry.records.push(record.clone());
            info!(
                zone = %entry.zone.name,
                record = %record.name,
                record_type = %record.record_type,
                "Created record in memory provider"
            );
            return Ok(CreateOutcome::Created);
        }
        Err(Error::provider(format!("no zone with id {zone_id}")))
    }
}

#[async_trait]
impl TxtResolver for MemoryProvider {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>> {
        for entry in self.zones.iter() {
            if let Some(record) = entry
                .records
                .iter()
                .find(|r| r.name == name && r.record_type == RecordType::Txt)
            {
                return Ok(record.values.clone());
            }
        }
        Err(Error::resolver(format!("no TXT records for {name}")))
    }
}
