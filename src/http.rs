pub use feedcore::net::{HttpClient, HttpRequest, HttpResponse};
pub use feedsync_ureq_http_client::UreqHttpClient;
