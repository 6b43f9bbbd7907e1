//! Session Guard demo application.
//!
//! Form login with bcrypt passwords, URL rules per role and a single
//! session per user.

pub mod handlers;

use std::sync::Arc;

use actix_web::web;

use session_guard_core::http::security::{
    AccessPolicy, FormLoginConfig, HttpSecurity, InMemoryUserRepository, PasswordEncodeError,
    PasswordEncoder, SecurityFilterChain, SessionFixationStrategy, SessionManagementConfig,
    UserRecord, UserRepository,
};

/// Login page of the demo.
pub const LOGIN_PAGE: &str = "/loginForm";

/// Registers the demo users.
///
/// Users:
/// - admin/admin: ROLE_ADMIN
/// - manager/manager: ROLE_MANAGER
/// - user/user: ROLE_USER
pub async fn seed_users(
    repository: &InMemoryUserRepository,
    encoder: &dyn PasswordEncoder,
) -> Result<(), PasswordEncodeError> {
    for (username, role) in [
        ("admin", "ROLE_ADMIN"),
        ("manager", "ROLE_MANAGER"),
        ("user", "ROLE_USER"),
    ] {
        let record = UserRecord::new(username, encoder.encode(username)?, role);
        repository.save(record).await;
    }
    Ok(())
}

/// # Spring Security Equivalent
/// ```java
/// @Bean
/// public SecurityFilterChain filterChain(HttpSecurity http) throws Exception {
///     http.authorizeHttpRequests(auth -> auth
///             .requestMatchers("/user/**").authenticated()
///             .requestMatchers("/manager/**").hasAnyRole("ADMIN", "MANAGER")
///             .requestMatchers("/admin/**").hasRole("ADMIN")
///             .anyRequest().permitAll())
///         .formLogin(form -> form
///             .loginPage("/loginForm")
///             .loginProcessingUrl("/login")
///             .defaultSuccessUrl("/")
///             .permitAll())
///         .sessionManagement(session -> session
///             .sessionFixation().changeSessionId()
///             .maximumSessions(1)
///             .maxSessionsPreventsLogin(true)
///             .expiredUrl("/loginForm"));
///     return http.build();
/// }
/// ```
pub fn security_config(
    repository: Arc<dyn UserRepository>,
    encoder: Arc<dyn PasswordEncoder>,
) -> HttpSecurity {
    HttpSecurity::new(repository, encoder)
        .authorize_http_requests(
            AccessPolicy::new()
                .request_matchers(&["/user/**"])
                .authenticated()
                .request_matchers(&["/manager/**"])
                .has_any_role(&["ADMIN", "MANAGER"])
                .request_matchers(&["/admin/**"])
                .has_role("ADMIN")
                .any_request()
                .permit_all(),
        )
        .form_login(
            FormLoginConfig::new()
                .login_page(LOGIN_PAGE)
                .login_processing_url("/login")
                .default_success_url("/")
                .permit_all(true),
        )
        .session_management(
            SessionManagementConfig::new()
                .fixation_strategy(SessionFixationStrategy::ChangeSessionId)
                .maximum_sessions(1)
                .max_sessions_prevents_login(true)
                .expired_url(LOGIN_PAGE),
        )
}

/// Shares the chain with the login handlers and mounts every route.
pub fn configure(chain: Arc<SecurityFilterChain>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::from(chain))
            .service(handlers::login::login_form)
            .service(handlers::login::login)
            .service(handlers::login::logout)
            .service(handlers::home::index)
            .service(handlers::home::public_info)
            .service(handlers::home::user)
            .service(handlers::home::manager)
            .service(handlers::home::admin)
            .service(handlers::secured::info)
            .service(handlers::secured::data);
    }
}
