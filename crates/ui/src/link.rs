//! Navigation collaborator

/// Moves the main view when a thumbnail is activated
pub trait LinkService {
    /// Current page of the main view
    fn page(&self) -> u32;

    /// Navigate the main view to `page_number`
    fn set_page(&self, page_number: u32);

    /// URL for an in-document anchor such as `#page=3`
    fn anchor_url(&self, hash: &str) -> String {
        hash.to_string()
    }
}
