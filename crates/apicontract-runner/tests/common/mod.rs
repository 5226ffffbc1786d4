//! In-process fake of the mercado API
//!
//! Follows the observed contract, including its quirks: product creation
//! for an unknown store answers 400, and listing a never-populated
//! `semAlcool` collection answers 404 with a localized message.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::{Value, json};

use apicontract_core::{Config, Method, ResolvedRequest, Response};
use apicontract_runner::{Transport, TransportError};

pub const BASE_URL: &str = "http://mercado.fake";

pub fn config() -> Config {
    Config {
        base_url: BASE_URL.into(),
        ..Config::default()
    }
}

#[derive(Debug, Clone)]
struct Store {
    nome: String,
    cnpj: String,
    endereco: String,
    com_alcool: Vec<Value>,
    sem_alcool: Option<Vec<Value>>,
}

impl Store {
    fn to_json(&self, id: u64) -> Value {
        json!({
            "id": id,
            "nome": self.nome,
            "cnpj": self.cnpj,
            "endereco": self.endereco,
        })
    }
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    stores: BTreeMap<u64, Store>,
}

impl State {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Fake server state plus instrumentation for concurrency assertions.
#[derive(Debug, Default)]
pub struct FakeMercado {
    state: Mutex<State>,
    requests: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    /// Answer 200 with an empty list for an empty `semAlcool` collection
    symmetric: bool,
    latency: Option<Duration>,
}

impl FakeMercado {
    pub fn new() -> Self {
        Self::default()
    }

    /// A server where `semAlcool` behaves like `comAlcool`.
    pub fn symmetric() -> Self {
        Self {
            symmetric: true,
            ..Self::default()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn store_count(&self) -> usize {
        self.state.lock().unwrap().stores.len()
    }

    fn handle(&self, request: &ResolvedRequest) -> Response {
        let path = request
            .url
            .strip_prefix(BASE_URL)
            .unwrap_or(&request.url)
            .trim_end_matches('/');
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let body = request.body.as_ref();
        let mut state = self.state.lock().unwrap();

        match (request.method, segments.as_slice()) {
            (Method::Post, ["mercado"]) => create_store(&mut state, body),
            (Method::Get, ["mercado", id]) => match lookup(&state, id) {
                Some((id, store)) => Response::json_body(200, &store.to_json(id)),
                None => store_not_found(id),
            },
            (Method::Put, ["mercado", id]) => update_store(&mut state, id, body),
            (Method::Delete, ["mercado", id]) => match parse_id(id) {
                Some(key) if state.stores.remove(&key).is_some() => Response::json_body(
                    200,
                    &json!({"message": format!("Mercado com ID {key} foi removido com sucesso.")}),
                ),
                _ => store_not_found(id),
            },
            (Method::Post, ["mercado", id, "produtos", "bebidas", kind]) => {
                create_product(&mut state, id, kind, body)
            }
            (Method::Get, ["mercado", id, "produtos", "bebidas", kind]) => {
                self.list_products(&state, id, kind)
            }
            (Method::Delete, ["mercado", id, "produtos", "bebidas", kind, pid]) => {
                delete_product(&mut state, id, kind, pid)
            }
            _ => Response::json_body(404, &json!({"message": "Rota não encontrada"})),
        }
    }

    fn list_products(&self, state: &State, id: &str, kind: &str) -> Response {
        let Some((_, store)) = lookup(state, id) else {
            return store_not_found(id);
        };
        match kind {
            "comAlcool" => Response::json_body(200, &json!({"product_item": store.com_alcool})),
            "semAlcool" => match &store.sem_alcool {
                Some(items) => Response::json_body(200, &json!({"product_item": items})),
                None if self.symmetric => Response::json_body(200, &json!({"product_item": []})),
                None => Response::json_body(
                    404,
                    &json!({"message": "A key semAlcool ainda não existe no produto bebidas"}),
                ),
            },
            _ => Response::json_body(404, &json!({"message": "Rota não encontrada"})),
        }
    }
}

#[async_trait::async_trait]
impl Transport for FakeMercado {
    async fn send(&self, request: &ResolvedRequest) -> Result<Response, TransportError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }

        let response = self.handle(request);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(response)
    }
}

fn parse_id(raw: &str) -> Option<u64> {
    raw.parse().ok()
}

fn lookup<'a>(state: &'a State, raw: &str) -> Option<(u64, &'a Store)> {
    let id = parse_id(raw)?;
    state.stores.get(&id).map(|s| (id, s))
}

fn store_not_found(raw: &str) -> Response {
    Response::json_body(
        404,
        &json!({"message": format!("Mercado com ID {raw} não encontrado.")}),
    )
}

fn validation_error(field: &str) -> Response {
    Response::json_body(
        400,
        &json!({"errors": [{"msg": format!("{field} é obrigatório"), "path": field}]}),
    )
}

fn text_field(body: Option<&Value>, field: &str) -> Result<String, Response> {
    body.and_then(|b| b.get(field))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| validation_error(field))
}

fn store_fields(body: Option<&Value>) -> Result<(String, String, String), Response> {
    Ok((
        text_field(body, "nome")?,
        text_field(body, "cnpj")?,
        text_field(body, "endereco")?,
    ))
}

fn create_store(state: &mut State, body: Option<&Value>) -> Response {
    let (nome, cnpj, endereco) = match store_fields(body) {
        Ok(fields) => fields,
        Err(resp) => return resp,
    };
    let id = state.next();
    let store = Store {
        nome,
        cnpj,
        endereco,
        com_alcool: Vec::new(),
        sem_alcool: None,
    };
    let created = store.to_json(id);
    let message = format!("Mercado '{}' criado com sucesso!", store.nome);
    state.stores.insert(id, store);
    Response::json_body(201, &json!({"message": message, "novoMercado": created}))
}

fn update_store(state: &mut State, raw: &str, body: Option<&Value>) -> Response {
    let Some(id) = parse_id(raw).filter(|id| state.stores.contains_key(id)) else {
        return store_not_found(raw);
    };
    let (nome, cnpj, endereco) = match store_fields(body) {
        Ok(fields) => fields,
        Err(resp) => return resp,
    };
    let Some(store) = state.stores.get_mut(&id) else {
        return store_not_found(raw);
    };
    store.nome = nome;
    store.cnpj = cnpj;
    store.endereco = endereco;
    Response::json_body(
        200,
        &json!({
            "message": format!("Mercado com ID {id} atualizado com sucesso."),
            "mercado": store.to_json(id),
        }),
    )
}

fn create_product(state: &mut State, raw: &str, kind: &str, body: Option<&Value>) -> Response {
    let Some(id) = parse_id(raw).filter(|id| state.stores.contains_key(id)) else {
        return validation_error("mercadoId");
    };
    let nome = match text_field(body, "nome") {
        Ok(nome) => nome,
        Err(resp) => return resp,
    };
    let Some(valor) = body.and_then(|b| b.get("valor")).filter(|v| v.is_number()) else {
        return validation_error("valor");
    };
    let item = json!({"id": state.next(), "nome": nome, "valor": valor});

    let Some(store) = state.stores.get_mut(&id) else {
        return validation_error("mercadoId");
    };
    match kind {
        "comAlcool" => store.com_alcool.push(item.clone()),
        "semAlcool" => store.sem_alcool.get_or_insert_with(Vec::new).push(item.clone()),
        _ => return Response::json_body(404, &json!({"message": "Rota não encontrada"})),
    }
    Response::json_body(
        201,
        &json!({"message": "Produto adicionado com sucesso", "product_item": item}),
    )
}

fn delete_product(state: &mut State, raw: &str, kind: &str, pid: &str) -> Response {
    let Some(store) = parse_id(raw).and_then(|id| state.stores.get_mut(&id)) else {
        return store_not_found(raw);
    };
    let items = match kind {
        "comAlcool" => Some(&mut store.com_alcool),
        "semAlcool" => store.sem_alcool.as_mut(),
        _ => None,
    };
    let pid_num = parse_id(pid);
    let removed = items.and_then(|items| {
        let pos = items
            .iter()
            .position(|i| i.get("id").and_then(Value::as_u64) == pid_num)?;
        Some(items.remove(pos))
    });
    match removed {
        Some(_) => Response::json_body(
            200,
            &json!({"message": format!("Produto com ID {pid} removido com sucesso.")}),
        ),
        None => Response::json_body(
            404,
            &json!({"message": format!("Produto com ID {pid} não encontrado.")}),
        ),
    }
}
