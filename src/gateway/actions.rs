//! Action table
//!
//! Maps each action name to the handler that runs its single statement.
//! Every handler has the same shape, so handlers can be registered,
//! looked up and tested one at a time.

use std::collections::HashMap;

use futures_util::future::BoxFuture;
use serde_json::Value;

use super::reply;
use super::request::ActionRequest;
use crate::store::{FundFields, NewTransaction, ProductFields, Store, User, UserUpdate};

/// Uniform handler signature: open store + request in, JSON reply out
pub type Handler = for<'a> fn(&'a mut dyn Store, &'a ActionRequest) -> BoxFuture<'a, Value>;

/// Whether the action reads a JSON body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyPolicy {
    Ignored,
    Required,
}

/// A registered action
#[derive(Clone, Copy)]
pub struct Action {
    pub body: BodyPolicy,
    pub handler: Handler,
}

/// Name → action lookup
pub struct ActionTable {
    actions: HashMap<&'static str, Action>,
}

impl ActionTable {
    pub fn empty() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: &'static str, body: BodyPolicy, handler: Handler) {
        self.actions.insert(name, Action { body, handler });
    }

    pub fn get(&self, name: &str) -> Option<Action> {
        self.actions.get(name).copied()
    }
}

impl Default for ActionTable {
    fn default() -> Self {
        use BodyPolicy::{Ignored, Required};

        let mut table = Self::empty();
        table.register("get_users", Ignored, get_users);
        table.register("get_user", Ignored, get_user);
        table.register("get_password", Ignored, get_password);
        table.register("create_user", Required, create_user);
        table.register("update_user", Required, update_user);
        table.register("get_products", Ignored, get_products);
        table.register("create_product", Required, create_product);
        table.register("update_product", Required, update_product);
        table.register("delete_product", Ignored, delete_product);
        table.register("get_funds", Ignored, get_funds);
        table.register("create_fund", Required, create_fund);
        table.register("update_fund", Required, update_fund);
        table.register("delete_fund", Ignored, delete_fund);
        table.register("get_transactions", Ignored, get_transactions);
        table.register("add_transaction", Required, add_transaction);
        table
    }
}

// ---- users ----

fn get_users<'a>(store: &'a mut dyn Store, _req: &'a ActionRequest) -> BoxFuture<'a, Value> {
    Box::pin(async move { reply::rows(store.list_users().await) })
}

fn get_user<'a>(store: &'a mut dyn Store, req: &'a ActionRequest) -> BoxFuture<'a, Value> {
    Box::pin(async move { reply::rows(store.find_user(req.query.key("email")).await) })
}

// Plaintext password lookup, kept because existing clients log in with it
fn get_password<'a>(store: &'a mut dyn Store, req: &'a ActionRequest) -> BoxFuture<'a, Value> {
    Box::pin(async move { reply::rows(store.find_password(req.query.key("email")).await) })
}

fn create_user<'a>(store: &'a mut dyn Store, req: &'a ActionRequest) -> BoxFuture<'a, Value> {
    Box::pin(async move {
        let Some(user) = req.payload::<User>() else {
            return reply::no_data();
        };
        reply::written(store.insert_user(&user).await)
    })
}

fn update_user<'a>(store: &'a mut dyn Store, req: &'a ActionRequest) -> BoxFuture<'a, Value> {
    Box::pin(async move {
        let Some(update) = req.payload::<UserUpdate>() else {
            return reply::no_data();
        };
        reply::written(store.update_user(&update).await)
    })
}

// ---- products ----

fn get_products<'a>(store: &'a mut dyn Store, _req: &'a ActionRequest) -> BoxFuture<'a, Value> {
    Box::pin(async move { reply::rows(store.list_products().await) })
}

fn create_product<'a>(store: &'a mut dyn Store, req: &'a ActionRequest) -> BoxFuture<'a, Value> {
    Box::pin(async move {
        let Some(product) = req.payload::<ProductFields>() else {
            return reply::no_data();
        };
        reply::written(store.insert_product(&product).await)
    })
}

fn update_product<'a>(store: &'a mut dyn Store, req: &'a ActionRequest) -> BoxFuture<'a, Value> {
    Box::pin(async move {
        let Some(product) = req.payload::<ProductFields>() else {
            return reply::no_data();
        };
        reply::written(store.update_product(&product).await)
    })
}

fn delete_product<'a>(store: &'a mut dyn Store, req: &'a ActionRequest) -> BoxFuture<'a, Value> {
    Box::pin(async move { reply::written(store.delete_product(req.query.key("id")).await) })
}

// ---- funds ----

fn get_funds<'a>(store: &'a mut dyn Store, _req: &'a ActionRequest) -> BoxFuture<'a, Value> {
    Box::pin(async move { reply::rows(store.list_funds().await) })
}

fn create_fund<'a>(store: &'a mut dyn Store, req: &'a ActionRequest) -> BoxFuture<'a, Value> {
    Box::pin(async move {
        let Some(fund) = req.payload::<FundFields>() else {
            return reply::no_data();
        };
        reply::written(store.insert_fund(&fund).await)
    })
}

fn update_fund<'a>(store: &'a mut dyn Store, req: &'a ActionRequest) -> BoxFuture<'a, Value> {
    Box::pin(async move {
        let Some(fund) = req.payload::<FundFields>() else {
            return reply::no_data();
        };
        reply::written(store.update_fund(&fund).await)
    })
}

fn delete_fund<'a>(store: &'a mut dyn Store, req: &'a ActionRequest) -> BoxFuture<'a, Value> {
    Box::pin(async move { reply::written(store.delete_fund(req.query.key("code")).await) })
}

// ---- transactions ----

fn get_transactions<'a>(store: &'a mut dyn Store, req: &'a ActionRequest) -> BoxFuture<'a, Value> {
    Box::pin(async move { reply::rows(store.list_transactions(req.query.key("user_id")).await) })
}

fn add_transaction<'a>(store: &'a mut dyn Store, req: &'a ActionRequest) -> BoxFuture<'a, Value> {
    Box::pin(async move {
        let Some(tx) = req.payload::<NewTransaction>() else {
            return reply::no_data();
        };
        reply::written(store.insert_transaction(&tx).await)
    })
}
