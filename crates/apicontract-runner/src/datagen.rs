//! Fixture data generation
//!
//! Field values for request bodies: store names, CNPJs, zip codes, product
//! names and prices. Seedable so a whole run can be reproduced.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

const COMPANY_PREFIXES: &[&str] = &[
    "Mercado", "Armazém", "Empório", "Supermercado", "Mercearia", "Atacadão", "Hortifruti",
];
const COMPANY_NAMES: &[&str] = &[
    "Silva", "Souza", "Oliveira", "Pereira", "Costa", "Almeida", "Ferreira", "Rodrigues",
    "Barbosa", "Carvalho",
];
const COMPANY_SUFFIXES: &[&str] = &["Ltda", "S.A.", "& Filhos", "ME", "EIRELI"];

const PRODUCT_ADJECTIVES: &[&str] = &[
    "Artesanal", "Gelada", "Premium", "Clássica", "Tropical", "Dourada", "Especial", "Leve",
];
const PRODUCT_NOUNS: &[&str] = &[
    "Cerveja", "Vinho", "Suco", "Refrigerante", "Água", "Chá", "Cachaça", "Kombucha",
];

/// Kind of value a request field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    CompanyName,
    /// 14 digits, no punctuation
    Cnpj,
    /// `#####-###`
    ZipCode,
    ProductName,
    /// Integer price, a multiple of 100
    Price,
    /// Two decimal places, used where the API must reject the value
    Decimal,
}

/// Seedable generator of fixture values.
#[derive(Debug, Clone)]
pub struct Faker {
    rng: SmallRng,
}

impl Faker {
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Generate a value of the given kind.
    pub fn value(&mut self, kind: FieldKind) -> Value {
        match kind {
            FieldKind::CompanyName => Value::String(self.company_name()),
            FieldKind::Cnpj => Value::String(self.cnpj()),
            FieldKind::ZipCode => Value::String(self.zip_code()),
            FieldKind::ProductName => Value::String(self.product_name()),
            FieldKind::Price => Value::from(self.price()),
            FieldKind::Decimal => serde_json::Number::from_f64(self.decimal())
                .map_or(Value::Null, Value::Number),
        }
    }

    pub fn company_name(&mut self) -> String {
        format!(
            "{} {} {}",
            pick(&mut self.rng, COMPANY_PREFIXES),
            pick(&mut self.rng, COMPANY_NAMES),
            pick(&mut self.rng, COMPANY_SUFFIXES)
        )
    }

    pub fn cnpj(&mut self) -> String {
        digits(&mut self.rng, 14)
    }

    pub fn zip_code(&mut self) -> String {
        format!("{}-{}", digits(&mut self.rng, 5), digits(&mut self.rng, 3))
    }

    pub fn product_name(&mut self) -> String {
        format!(
            "{} {} {}",
            pick(&mut self.rng, PRODUCT_NOUNS),
            pick(&mut self.rng, PRODUCT_ADJECTIVES),
            self.rng.gen_range(100..1000_u32)
        )
    }

    pub fn price(&mut self) -> u64 {
        self.rng.gen_range(1..=100_u64) * 100
    }

    /// Two-decimal value between 0.01 and 999.99.
    pub fn decimal(&mut self) -> f64 {
        f64::from(self.rng.gen_range(1..100_000_u32)) / 100.0
    }
}

/// A random seed for a run that was not given one.
///
/// Kept below `i64::MAX` so it can be written back into a TOML config.
#[must_use]
pub fn fresh_seed() -> u64 {
    rand::thread_rng().r#gen::<u64>() >> 1
}

fn pick<'a>(rng: &mut impl Rng, items: &[&'a str]) -> &'a str {
    items[rng.gen_range(0..items.len())]
}

fn digits(rng: &mut impl Rng, len: usize) -> String {
    (0..len)
        .map(|_| char::from(b'0' + rng.gen_range(0..10_u8)))
        .collect()
}
