//! In-memory commerce API for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use cartmirror_core::ProductMetadata;
use cartmirror_extract::types::{JsonScalar, RemoteCart, RemoteCartItem, RemoteProduct};
use cartmirror_extract::{CommerceApi, ExtractError};
use futures::future::BoxFuture;

/// Records every call and serves a fixed product table. Mutations fail when
/// `fail_mutations` is set.
#[derive(Default)]
pub(crate) struct FakeCommerce {
    pub products: HashMap<String, ProductMetadata>,
    pub lines: Mutex<Vec<(String, u32)>>,
    pub calls: Mutex<Vec<String>>,
    pub fail_mutations: bool,
}

impl FakeCommerce {
    pub(crate) fn with_product(mut self, meta: ProductMetadata) -> Self {
        self.products.insert(meta.product_id.clone(), meta);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("calls lock").push(call);
    }

    fn mutation(&self, call: String) -> Result<(), ExtractError> {
        self.record(call);
        if self.fail_mutations {
            return Err(ExtractError::UnexpectedStatus {
                status: 500,
                url: "fake://cart".to_string(),
            });
        }
        Ok(())
    }
}

impl CommerceApi for FakeCommerce {
    fn get_cart(&self) -> BoxFuture<'_, Result<RemoteCart, ExtractError>> {
        self.record("get_cart".to_string());
        let items = self
            .lines
            .lock()
            .expect("lines lock")
            .iter()
            .map(|(id, quantity)| RemoteCartItem {
                id: JsonScalar::Text(id.clone()),
                product_id: Some(JsonScalar::Text(id.clone())),
                variant_id: None,
                quantity: Some(JsonScalar::Number((*quantity).into())),
                total: None,
                product: Some(RemoteProduct {
                    price: Some(JsonScalar::Number(10.into())),
                    ..RemoteProduct::default()
                }),
            })
            .collect();
        Box::pin(std::future::ready(Ok(RemoteCart { items, total: None })))
    }

    fn add_item<'a>(
        &'a self,
        product_id: &'a str,
        quantity: u32,
    ) -> BoxFuture<'a, Result<(), ExtractError>> {
        let result = self.mutation(format!("add {product_id} {quantity}"));
        if result.is_ok() {
            self.lines
                .lock()
                .expect("lines lock")
                .push((product_id.to_string(), quantity));
        }
        Box::pin(std::future::ready(result))
    }

    fn update_item<'a>(
        &'a self,
        item_id: &'a str,
        quantity: u32,
    ) -> BoxFuture<'a, Result<(), ExtractError>> {
        let result = self.mutation(format!("update {item_id} {quantity}"));
        if result.is_ok() {
            for line in self.lines.lock().expect("lines lock").iter_mut() {
                if line.0 == item_id {
                    line.1 = quantity;
                }
            }
        }
        Box::pin(std::future::ready(result))
    }

    fn delete_item<'a>(&'a self, item_id: &'a str) -> BoxFuture<'a, Result<(), ExtractError>> {
        let result = self.mutation(format!("delete {item_id}"));
        if result.is_ok() {
            self.lines
                .lock()
                .expect("lines lock")
                .retain(|(id, _)| id != item_id);
        }
        Box::pin(std::future::ready(result))
    }

    fn clear_cart(&self) -> BoxFuture<'_, Result<(), ExtractError>> {
        let result = self.mutation("clear".to_string());
        if result.is_ok() {
            self.lines.lock().expect("lines lock").clear();
        }
        Box::pin(std::future::ready(result))
    }

    fn get_product<'a>(
        &'a self,
        product_id: &'a str,
    ) -> BoxFuture<'a, Result<ProductMetadata, ExtractError>> {
        self.record(format!("product {product_id}"));
        let result = self
            .products
            .get(product_id)
            .cloned()
            .ok_or_else(|| ExtractError::NotFound {
                url: format!("fake://products/{product_id}"),
            });
        Box::pin(std::future::ready(result))
    }
}
