//! Record filters for ledger queries.

use gichain_core::Block;

/// Conjunction of optional field matches. An empty filter matches every block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockFilter {
    pub tag_id: Option<String>,
    pub product_id: Option<u64>,
    pub ownership_id: Option<String>,
    pub transaction_id: Option<String>,
    pub user_id: Option<String>,
}

impl BlockFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, tag_id: impl Into<String>) -> Self {
        self.tag_id = Some(tag_id.into());
        self
    }

    pub fn product(mut self, product_id: u64) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn ownership(mut self, ownership_id: impl Into<String>) -> Self {
        self.ownership_id = Some(ownership_id.into());
        self
    }

    pub fn transaction(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn matches(&self, block: &Block) -> bool {
        let content = &block.content;
        fn eq<T: PartialEq + ?Sized>(wanted: Option<&T>, actual: &T) -> bool {
            wanted.map_or(true, |w| w == actual)
        }

        eq(self.tag_id.as_deref(), content.gi_tag.tag_id.as_str())
            && eq(self.product_id.as_ref(), &content.product.product_id)
            && eq(
                self.ownership_id.as_deref(),
                content.ownership.ownership_id.as_str(),
            )
            && eq(
                self.transaction_id.as_deref(),
                content.transaction.transaction_id.as_str(),
            )
            && eq(self.user_id.as_deref(), content.user.user_id.as_str())
    }
}
