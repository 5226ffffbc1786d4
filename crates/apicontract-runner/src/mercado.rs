//! Built-in contract suite for the `mercado` API
//!
//! Three groups: stores, alcoholic drinks and non-alcoholic drinks. Every
//! scenario creates the fixtures it needs; nothing is shared between
//! scenarios and nothing is cleaned up afterwards.
//!
//! The API answers 400 (not 404) when a product is created for an unknown
//! store, and 404 with a localized message when the never-populated
//! `semAlcool` collection is listed. Both are asserted as-is.

use serde_json::json;

use apicontract_core::{RequestSpec, Scenario};

use crate::datagen::{Faker, FieldKind};

/// Marker present in every successful mutation response.
pub const SUCCESS_MARKER: &str = "sucesso";
/// Marker present in validation error responses.
pub const ERROR_MARKER: &str = "errors";
/// Message returned when listing an empty `semAlcool` collection.
pub const MISSING_SEM_ALCOOL: &str = "A key semAlcool ainda não existe";
/// Id that never exists on the server.
pub const UNKNOWN_ID: &str = "0";

pub const GROUP_MERCADO: &str = "Mercado";
pub const GROUP_COM_ALCOOL: &str = "Bebidas com álcool";
pub const GROUP_SEM_ALCOOL: &str = "Bebidas sem álcool";

/// Drink sub-collection of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bebida {
    ComAlcool,
    SemAlcool,
}

impl Bebida {
    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::ComAlcool => "comAlcool",
            Self::SemAlcool => "semAlcool",
        }
    }

    /// Collection path for store `store`, which may be a template.
    #[must_use]
    pub fn collection(self, store: &str) -> String {
        format!("/mercado/{store}/produtos/bebidas/{}", self.segment())
    }
}

const STORE: &str = "{{mercado.id}}";
const DRINK: &str = "{{bebida.id}}";

/// `POST /mercado` with fresh data; captures the created store as `mercado`.
pub fn create_store(faker: &mut Faker) -> RequestSpec {
    RequestSpec::post("/mercado")
        .json(json!({
            "nome": faker.value(FieldKind::CompanyName),
            "cnpj": faker.value(FieldKind::Cnpj),
            "endereco": faker.value(FieldKind::ZipCode),
        }))
        .expect_status(201)
        .expect_body_contains(SUCCESS_MARKER)
        .expect_non_empty("novoMercado.id")
        .returns_at("mercado", "novoMercado")
}

/// Create a drink in the captured store; captures it as `bebida`.
pub fn create_drink(faker: &mut Faker, kind: Bebida) -> RequestSpec {
    RequestSpec::post(kind.collection(STORE))
        .json(json!({
            "nome": faker.value(FieldKind::ProductName),
            "valor": faker.value(FieldKind::Price),
        }))
        .expect_status(201)
        .expect_body_contains(SUCCESS_MARKER)
        .expect_non_empty("product_item.id")
        .returns_at("bebida", "product_item")
}

/// The full suite, with fixture data drawn from `faker`.
pub fn suite(faker: &mut Faker) -> Vec<Scenario> {
    let mut scenarios = mercado(faker);
    scenarios.extend(bebidas_com_alcool(faker));
    scenarios.extend(bebidas_sem_alcool(faker));
    scenarios
}

fn mercado(faker: &mut Faker) -> Vec<Scenario> {
    let g = GROUP_MERCADO;
    let unknown = format!("/mercado/{UNKNOWN_ID}");
    let existing = format!("/mercado/{STORE}");

    let new_zip = faker.zip_code();
    let update = Scenario::new(g, "Atualizar um mercado existente")
        .given(create_store(faker))
        .when(
            RequestSpec::put(existing.clone())
                .json(json!({
                    "nome": "{{mercado.nome}}",
                    "cnpj": "{{mercado.cnpj}}",
                    "endereco": new_zip,
                }))
                .expect_status(200)
                .expect_body_contains(SUCCESS_MARKER)
                .expect_body_contains(new_zip.clone()),
        );

    let lifecycle_zip = faker.zip_code();
    let lifecycle = Scenario::new(g, "Ciclo de vida do mercado")
        .given(create_store(faker))
        .given(
            RequestSpec::put(existing.clone())
                .json(json!({
                    "nome": "{{mercado.nome}}",
                    "cnpj": "{{mercado.cnpj}}",
                    "endereco": lifecycle_zip,
                }))
                .expect_status(200)
                .expect_body_contains(SUCCESS_MARKER)
                .expect_body_contains(lifecycle_zip.clone()),
        )
        .given(RequestSpec::delete(existing.clone()).expect_status(200))
        .when(RequestSpec::delete(existing.clone()).expect_status(404));

    let read_zip = faker.zip_code();
    let read_after_write = Scenario::new(g, "Ler mercado após atualização")
        .given(create_store(faker))
        .given(
            RequestSpec::put(existing.clone())
                .json(json!({
                    "nome": "{{mercado.nome}}",
                    "cnpj": "{{mercado.cnpj}}",
                    "endereco": read_zip,
                }))
                .expect_status(200),
        )
        .when(
            RequestSpec::get(existing.clone())
                .expect_status(200)
                .expect_body_contains(read_zip),
        );

    vec![
        Scenario::new(g, "Criar um novo mercado inválido").when(
            RequestSpec::post("/mercado")
                .expect_status(400)
                .expect_body_contains(ERROR_MARKER),
        ),
        update,
        Scenario::new(g, "Obter mercado existente")
            .given(create_store(faker))
            .when(RequestSpec::get(existing.clone()).expect_status(200)),
        Scenario::new(g, "Obter mercado inexistente")
            .when(RequestSpec::get(unknown.clone()).expect_status(404)),
        Scenario::new(g, "Atualizar um mercado inexistente")
            .when(RequestSpec::put(unknown.clone()).expect_status(404)),
        Scenario::new(g, "Deletar mercado existente")
            .given(create_store(faker))
            .when(RequestSpec::delete(existing).expect_status(200)),
        Scenario::new(g, "Deletar mercado inexistente")
            .when(RequestSpec::delete(unknown).expect_status(404)),
        lifecycle,
        read_after_write,
    ]
}

fn bebidas_com_alcool(faker: &mut Faker) -> Vec<Scenario> {
    let g = GROUP_COM_ALCOOL;
    let kind = Bebida::ComAlcool;

    vec![
        Scenario::new(g, "Criar uma nova bebida com álcool para loja inexistente").when(
            RequestSpec::post(kind.collection(UNKNOWN_ID))
                .json(json!({
                    "nome": faker.value(FieldKind::ProductName),
                    "valor": faker.value(FieldKind::Decimal),
                }))
                .expect_status(400)
                .expect_body_contains(ERROR_MARKER),
        ),
        Scenario::new(g, "Criar uma nova bebida com álcool inválida")
            .given(create_store(faker))
            .when(
                RequestSpec::post(kind.collection(STORE))
                    .expect_status(400)
                    .expect_body_contains(ERROR_MARKER),
            ),
        Scenario::new(g, "Obter bebidas com álcool válidas")
            .given(create_store(faker))
            .given(create_drink(faker, kind))
            .when(
                RequestSpec::get(kind.collection(STORE))
                    .expect_status(200)
                    .expect_body_contains("{{bebida.nome}}"),
            ),
        Scenario::new(g, "Deletar bebida com álcool existente")
            .given(create_store(faker))
            .given(create_drink(faker, kind))
            .when(
                RequestSpec::delete(format!("{}/{DRINK}", kind.collection(STORE)))
                    .expect_status(200),
            ),
        Scenario::new(g, "Deletar bebida com álcool inexistente")
            .given(create_store(faker))
            .given(create_drink(faker, kind))
            .when(
                RequestSpec::delete(format!("{}/{UNKNOWN_ID}", kind.collection(STORE)))
                    .expect_status(404),
            ),
    ]
}

fn bebidas_sem_alcool(faker: &mut Faker) -> Vec<Scenario> {
    let g = GROUP_SEM_ALCOOL;
    let kind = Bebida::SemAlcool;

    vec![
        Scenario::new(g, "Criar uma nova bebida sem álcool")
            .given(create_store(faker))
            .when(
                RequestSpec::post(kind.collection(STORE))
                    .json(json!({
                        "nome": faker.value(FieldKind::ProductName),
                        "valor": faker.value(FieldKind::Price),
                    }))
                    .expect_status(201)
                    .expect_body_contains(SUCCESS_MARKER),
            ),
        Scenario::new(g, "Criar uma nova bebida sem álcool para loja inexistente").when(
            RequestSpec::post(kind.collection(UNKNOWN_ID))
                .json(json!({
                    "nome": faker.value(FieldKind::ProductName),
                    "valor": faker.value(FieldKind::Decimal),
                }))
                .expect_status(400)
                .expect_body_contains(ERROR_MARKER),
        ),
        Scenario::new(g, "Criar uma nova bebida sem álcool inválida")
            .given(create_store(faker))
            .when(
                RequestSpec::post(kind.collection(STORE))
                    .expect_status(400)
                    .expect_body_contains(ERROR_MARKER),
            ),
        Scenario::new(g, "Obter bebidas sem álcool inexistentes")
            .given(create_store(faker))
            .when(
                RequestSpec::get(kind.collection(STORE))
                    .expect_status(404)
                    .expect_body_contains(MISSING_SEM_ALCOOL),
            ),
        Scenario::new(g, "Deletar bebida sem álcool existente")
            .given(create_store(faker))
            .given(create_drink(faker, kind))
            .when(
                RequestSpec::delete(format!("{}/{DRINK}", kind.collection(STORE)))
                    .expect_status(200),
            ),
        Scenario::new(g, "Deletar bebida sem álcool inexistente")
            .given(create_store(faker))
            .when(
                RequestSpec::delete(format!("{}/{UNKNOWN_ID}", kind.collection(STORE)))
                    .expect_status(404),
            ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use apicontract_core::{Config, SuitePlan};
    use std::collections::HashSet;

    fn built() -> Vec<Scenario> {
        suite(&mut Faker::seeded(42))
    }

    #[test]
    fn suite_has_three_groups() {
        let groups: HashSet<_> = built().iter().map(|s| s.group().to_string()).collect();
        assert_eq!(groups.len(), 3);
        assert_eq!(built().len(), 20);
    }

    #[test]
    fn names_are_unique() {
        let scenarios = built();
        let ids: HashSet<_> = scenarios.iter().map(Scenario::id).collect();
        assert_eq!(ids.len(), scenarios.len());
    }

    #[test]
    fn every_reference_is_captured_first() {
        let plan = SuitePlan::from_scenarios(&built(), &Config::default());
        assert!(!plan.has_errors(), "{}", plan.to_terminal());
    }

    #[test]
    fn same_seed_builds_same_suite() {
        assert_eq!(suite(&mut Faker::seeded(1)), suite(&mut Faker::seeded(1)));
    }

    #[test]
    fn unknown_store_creation_expects_400() {
        let s = built()
            .into_iter()
            .find(|s| s.name() == "Criar uma nova bebida com álcool para loja inexistente")
            .unwrap();
        assert!(s.setup().is_empty());
        assert_eq!(s.act().path(), "/mercado/0/produtos/bebidas/comAlcool");
        assert!(s.act().expectations().iter().any(|e| e.to_string() == "status == 400"));
    }

    #[test]
    fn lifecycle_ends_with_second_delete() {
        let s = built()
            .into_iter()
            .find(|s| s.name() == "Ciclo de vida do mercado")
            .unwrap();
        let labels: Vec<_> = s.steps().map(|(_, label, _)| label).collect();
        assert_eq!(
            labels,
            vec![
                "setup[0] POST /mercado",
                "setup[1] PUT /mercado/{{mercado.id}}",
                "setup[2] DELETE /mercado/{{mercado.id}}",
                "act DELETE /mercado/{{mercado.id}}",
            ]
        );
    }

    #[test]
    fn lifecycle_update_checks_new_zip() {
        let s = built()
            .into_iter()
            .find(|s| s.name() == "Ciclo de vida do mercado")
            .unwrap();
        let put = &s.setup()[1];
        let zip = put.body().unwrap()["endereco"].as_str().unwrap().to_string();
        assert!(put.expectations().iter().any(|e| e.to_string() == format!("body contains {zip:?}")));
    }

    #[test]
    fn created_ids_must_be_non_empty() {
        let store = create_store(&mut Faker::seeded(3));
        let drink = create_drink(&mut Faker::seeded(3), Bebida::SemAlcool);
        assert!(store.expectations().iter().any(|e| e.to_string() == "field novoMercado.id non-empty"));
        assert!(drink.expectations().iter().any(|e| e.to_string() == "field product_item.id non-empty"));
    }

    #[test]
    fn invalid_creation_sends_no_body() {
        let invalid: Vec<_> = built()
            .into_iter()
            .filter(|s| s.name().contains("inválid"))
            .collect();
        assert_eq!(invalid.len(), 3);
        assert!(invalid.iter().all(|s| s.act().body().is_none()));
    }
}
