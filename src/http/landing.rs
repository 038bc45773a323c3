//! Static entry page with the target URL form.

use axum::extract::State;
use axum::response::Html;

use crate::http::request::TARGET_PARAM;
use crate::http::server::AppState;

pub async fn landing_page(State(state): State<AppState>) -> Html<String> {
    Html(render_form(&state.proxy_path))
}

fn render_form(action: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Rewrite Proxy</title>
</head>
<body>
  <h1>Rewrite Proxy</h1>
  <p>Enter the URL to open through the proxy:</p>
  <form method="get" action="{action}">
    <input type="text" name="{TARGET_PARAM}" placeholder="https://example.com" size="50" required>
    <button type="submit">Go</button>
  </form>
</body>
</html>
"#
    )
}
