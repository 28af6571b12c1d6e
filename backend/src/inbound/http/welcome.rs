//! HTML landing page served at `/`.

use actix_web::{HttpResponse, get, http::header::ContentType, web};

/// Values rendered into the landing page.
#[derive(Debug, Clone)]
pub struct WelcomePage {
    /// Service name shown in the heading.
    pub name: String,
    /// Stage prefix used to build the documentation link.
    pub root_path: String,
}

impl WelcomePage {
    fn render(&self) -> String {
        let name = escape_html(&self.name);
        let docs = format!("{}docs/", escape_html(&self.root_path));
        format!(
            "<!DOCTYPE html>\n\
             <html lang=\"en\">\n\
             <head><meta charset=\"utf-8\"><title>{name}</title></head>\n\
             <body>\n\
             <h1>{name}</h1>\n\
             <p>The API is running. Browse the <a href=\"{docs}\">API documentation</a>.</p>\n\
             </body>\n\
             </html>\n"
        )
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Serve the landing page.
#[get("/")]
pub async fn welcome(page: web::Data<WelcomePage>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(page.render())
}

#[cfg(test)]
mod tests {
    use actix_web::App;
    use actix_web::test as actix_test;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("/", "href=\"/docs/\"")]
    #[case("/dev/", "href=\"/dev/docs/\"")]
    #[actix_web::test]
    async fn links_docs_under_root_path(#[case] root_path: &str, #[case] link: &str) {
        let page = web::Data::new(WelcomePage {
            name: "user-service".to_owned(),
            root_path: root_path.to_owned(),
        });
        let app = actix_test::init_service(App::new().app_data(page).service(welcome)).await;
        let request = actix_test::TestRequest::get().uri("/").to_request();
        let body = actix_test::call_and_read_body(&app, request).await;
        let html = std::str::from_utf8(&body).expect("utf8 body");
        assert!(html.contains(link), "{html}");
        assert!(html.contains("<h1>user-service</h1>"));
    }

    #[rstest]
    fn names_are_escaped() {
        assert_eq!(escape_html("<a&b>"), "&lt;a&amp;b&gt;");
    }
}
