//! In-memory repositories and fixtures shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use enrollment_api::config::Config;
use enrollment_api::errors::AppError;
use enrollment_api::models::*;
use enrollment_api::postal_client::PostalLookupClient;
use enrollment_api::repositories::{AddressRepository, EnrollmentRepository};
use enrollment_api::services::EnrollmentService;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn create_test_config(via_cep_api: String) -> Config {
    Config {
        database_url: "postgresql://test".to_string(),
        port: 4000,
        via_cep_api,
    }
}

/// Enrollments and addresses kept in one store so address lookups can join.
#[derive(Default)]
pub struct MemoryStore {
    pub enrollments: Mutex<Vec<Enrollment>>,
    pub addresses: Mutex<Vec<Address>>,
    pub enrollment_upserts: AtomicUsize,
    pub address_upserts: AtomicUsize,
}

impl MemoryStore {
    pub fn enrollment_upserts(&self) -> usize {
        self.enrollment_upserts.load(Ordering::SeqCst)
    }

    pub fn address_upserts(&self) -> usize {
        self.address_upserts.load(Ordering::SeqCst)
    }

    pub fn insert_enrollment(&self, user_id: i32) -> Enrollment {
        let mut enrollments = self.enrollments.lock().unwrap();
        let now = Utc::now();
        let enrollment = Enrollment {
            id: enrollments.len() as i32 + 1,
            name: "Maria Souza".to_string(),
            cpf: "12345678909".to_string(),
            birthday: Utc.with_ymd_and_hms(1990, 5, 17, 0, 0, 0).unwrap(),
            phone: "(21) 98765-4321".to_string(),
            user_id,
            created_at: now,
            updated_at: now,
        };
        enrollments.push(enrollment.clone());
        enrollment
    }
}

pub struct MemoryEnrollmentRepository(pub Arc<MemoryStore>);

#[async_trait]
impl EnrollmentRepository for MemoryEnrollmentRepository {
    async fn find_with_address_by_user_id(
        &self,
        user_id: i32,
    ) -> Result<Option<EnrollmentWithAddress>, AppError> {
        let enrollments = self.0.enrollments.lock().unwrap();
        let Some(enrollment) = enrollments.iter().find(|e| e.user_id == user_id).cloned() else {
            return Ok(None);
        };

        let mut addresses: Vec<Address> = self
            .0
            .addresses
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.enrollment_id == enrollment.id)
            .cloned()
            .collect();
        addresses.sort_by_key(|a| a.id);

        Ok(Some(EnrollmentWithAddress {
            enrollment,
            addresses,
        }))
    }

    async fn upsert(
        &self,
        user_id: i32,
        create: &CreateEnrollmentParams,
        update: &UpdateEnrollmentParams,
    ) -> Result<Enrollment, AppError> {
        self.0.enrollment_upserts.fetch_add(1, Ordering::SeqCst);
        let mut enrollments = self.0.enrollments.lock().unwrap();
        let now = Utc::now();

        if let Some(existing) = enrollments.iter_mut().find(|e| e.user_id == user_id) {
            existing.name = update.name.clone();
            existing.cpf = update.cpf.clone();
            existing.birthday = update.birthday;
            existing.phone = update.phone.clone();
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let enrollment = Enrollment {
            id: enrollments.len() as i32 + 1,
            name: create.name.clone(),
            cpf: create.cpf.clone(),
            birthday: create.birthday,
            phone: create.phone.clone(),
            user_id,
            created_at: now,
            updated_at: now,
        };
        enrollments.push(enrollment.clone());
        Ok(enrollment)
    }
}

pub struct MemoryAddressRepository(pub Arc<MemoryStore>);

#[async_trait]
impl AddressRepository for MemoryAddressRepository {
    async fn upsert(
        &self,
        enrollment_id: i32,
        create: &CreateAddressParams,
        update: &UpdateAddressParams,
    ) -> Result<Address, AppError> {
        self.0.address_upserts.fetch_add(1, Ordering::SeqCst);
        let mut addresses = self.0.addresses.lock().unwrap();
        let now = Utc::now();

        if let Some(existing) = addresses
            .iter_mut()
            .find(|a| a.enrollment_id == enrollment_id)
        {
            existing.cep = update.cep.clone();
            existing.street = update.street.clone();
            existing.complement = update.complement.clone();
            existing.neighborhood = update.neighborhood.clone();
            existing.city = update.city.clone();
            existing.state = update.state.clone();
            if update.has_address_detail() {
                existing.address_detail = update.address_detail_value().map(String::from);
            }
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let address = Address {
            id: addresses.len() as i32 + 1,
            cep: create.cep.clone(),
            street: create.street.clone(),
            complement: create.complement.clone(),
            neighborhood: create.neighborhood.clone(),
            city: create.city.clone(),
            state: create.state.clone(),
            address_detail: create.address_detail_value().map(String::from),
            enrollment_id,
            created_at: now,
            updated_at: now,
        };
        addresses.push(address.clone());
        Ok(address)
    }
}

/// Service over a fresh in-memory store, looking CEPs up at `via_cep_api`.
pub fn memory_service(via_cep_api: String) -> (EnrollmentService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let config = create_test_config(via_cep_api);
    let service = EnrollmentService::new(
        Arc::new(MemoryEnrollmentRepository(store.clone())),
        Arc::new(MemoryAddressRepository(store.clone())),
        PostalLookupClient::new(&config),
    );
    (service, store)
}

pub fn paulista_address() -> CreateAddressParams {
    CreateAddressParams {
        cep: "01310100".to_string(),
        street: "Avenida Paulista".to_string(),
        complement: Some("de 612 a 1510 - lado par".to_string()),
        neighborhood: "Bela Vista".to_string(),
        city: "São Paulo".to_string(),
        state: "SP".to_string(),
        address_detail: Some(Some("Conjunto 42".to_string())),
    }
}

pub fn enrollment_params(user_id: i32, name: &str) -> CreateOrUpdateEnrollmentWithAddress {
    CreateOrUpdateEnrollmentWithAddress {
        enrollment: CreateEnrollmentParams {
            name: name.to_string(),
            cpf: "12345678909".to_string(),
            birthday: Utc.with_ymd_and_hms(1990, 5, 17, 0, 0, 0).unwrap(),
            phone: "(11) 98765-4321".to_string(),
            user_id,
        },
        address: paulista_address(),
    }
}

pub fn via_cep_body() -> serde_json::Value {
    serde_json::json!({
        "cep": "01310-100",
        "logradouro": "Avenida Paulista",
        "complemento": "de 612 a 1510 - lado par",
        "bairro": "Bela Vista",
        "localidade": "São Paulo",
        "uf": "SP",
        "ibge": "3550308",
        "gia": "1004",
        "ddd": "11",
        "siafi": "7107"
    })
}
