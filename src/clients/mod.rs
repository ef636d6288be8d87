pub mod captioning_client;
pub mod enrichment_client;
pub mod face_client;
pub mod http;
pub mod ocr_client;
pub mod payload;

pub use captioning_client::CaptioningClient;
pub use enrichment_client::EnrichmentClient;
pub use face_client::FaceClient;
pub use http::build_http_client;
pub use ocr_client::OcrClient;
pub use payload::{DocumentPayload, PayloadLoader, PayloadSource};
