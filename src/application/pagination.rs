//! Page-number pagination for preset listings.

use serde::{Deserialize, Serialize};

use crate::domain::entities::PresetListItem;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetPage {
    pub items: Vec<PresetListItem>,
    pub page: u32,
    pub has_more: bool,
}

impl PresetPage {
    /// Assemble a page from the rows a bounded query returned.
    ///
    /// `has_more` only proves the page was full: a page that ends exactly on
    /// the final row still reports `true`, and the follow-up fetch comes
    /// back empty. Detecting the boundary exactly would need a limit+1
    /// fetch.
    pub fn from_items(items: Vec<PresetListItem>, page: u32, page_size: u32) -> Self {
        let has_more = items.len() as u32 == page_size;
        Self {
            items,
            page,
            has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::domain::packages::PackageList;

    use super::*;

    fn item(slug: &str) -> PresetListItem {
        PresetListItem {
            id: slug.to_string(),
            title: "Test".to_string(),
            packages: PackageList::parse(&["a".to_string(), "b".to_string()]).expect("valid"),
            trends_url: "https://npmtrends.com/a-vs-b".to_string(),
            likes_count: 0,
            created_at: datetime!(2024-06-01 12:00 UTC),
            owner_name: None,
            owner_avatar: None,
            liked: None,
        }
    }

    #[test]
    fn partial_page_has_no_more() {
        let page = PresetPage::from_items(vec![item("one")], 1, 20);
        assert!(!page.has_more);
    }

    #[test]
    fn full_page_reports_more() {
        let items: Vec<PresetListItem> = (0..20).map(|i| item(&format!("p{i}"))).collect();
        let page = PresetPage::from_items(items, 1, 20);
        assert!(page.has_more);
    }
}
