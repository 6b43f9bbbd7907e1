//! Login page and the form login endpoints.

use std::collections::HashMap;

use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;

use session_guard_core::http::security::{LoginForm, SecurityFilterChain};

#[derive(Deserialize)]
pub struct LoginPageQuery {
    error: Option<String>,
    logout: Option<String>,
}

#[get("/loginForm")]
pub async fn login_form(
    query: web::Query<LoginPageQuery>,
    chain: web::Data<SecurityFilterChain>,
) -> impl Responder {
    let config = chain.form_login().config();
    let notice = if query.error.is_some() {
        "<p>Invalid username or password</p>"
    } else if query.logout.is_some() {
        "<p>You have been logged out</p>"
    } else {
        ""
    };

    HttpResponse::Ok().content_type("text/html").body(format!(
        r#"<h1>Login</h1>{notice}
<form method="post" action="{action}">
  <input type="text" name="{username}" placeholder="Username"/>
  <input type="password" name="{password}" placeholder="Password"/>
  <button>Login</button>
</form>"#,
        notice = notice,
        action = config.get_login_processing_url(),
        username = config.get_username_parameter(),
        password = config.get_password_parameter(),
    ))
}

/// # Spring Security Equivalent
/// `UsernamePasswordAuthenticationFilter` on `loginProcessingUrl("/login")`
#[post("/login")]
pub async fn login(
    req: HttpRequest,
    form: web::Form<HashMap<String, String>>,
    chain: web::Data<SecurityFilterChain>,
) -> HttpResponse {
    let handler = chain.form_login();
    let form = LoginForm::from_params(&form, handler.config());
    handler.attempt_authentication(&req, &form).await
}

#[post("/logout")]
pub async fn logout(req: HttpRequest, chain: web::Data<SecurityFilterChain>) -> HttpResponse {
    chain.form_login().logout(&req).await
}
