pub mod content_disposition;
