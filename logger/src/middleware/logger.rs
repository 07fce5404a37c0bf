use std::sync::Arc;
use std::time::Instant;

use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use colored::Colorize;
use futures::future::{LocalBoxFuture, Ready, ready};
use log::Level;

use super::request_id::RequestId;

/// Logs one line per request once the response status is known.
pub struct LoggerMiddleware {
    colorize: bool,
}

impl LoggerMiddleware {
    pub fn new(colorize: bool) -> Self {
        Self { colorize }
    }

    pub fn colorize(&self) -> bool {
        self.colorize
    }
}

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = LoggerMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoggerMiddlewareService {
            service: Arc::new(service),
            colorize: self.colorize,
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Arc<S>,
    colorize: bool,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Common request info
        let started = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let query = req.query_string().to_string();

        // IP
        let ip = req
            .connection_info()
            .realip_remote_addr()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());

        // Agent
        let user_agent = req
            .headers()
            .get("User-Agent")
            .map(|ua| ua.to_str().unwrap_or_default().to_string())
            .unwrap_or_default();

        let request_id = req
            .extensions()
            .get::<RequestId>()
            .map(|id| id.0.clone())
            .unwrap_or_else(|| "-".to_string());

        let srv = Arc::clone(&self.service);
        let colorize = self.colorize;

        Box::pin(async move {
            let res = srv.call(req).await?;

            let status_code = res.status().as_u16();
            let elapsed_ms = started.elapsed().as_millis();

            let line = RequestLine {
                status_code,
                method: &method,
                path: &path,
                elapsed_ms,
                query: &query,
                ip: &ip,
                user_agent: &user_agent,
                request_id: &request_id,
            };
            log::log!(level_for_status(status_code), "{}", line.render(colorize));

            Ok(res)
        })
    }
}

struct RequestLine<'a> {
    status_code: u16,
    method: &'a str,
    path: &'a str,
    elapsed_ms: u128,
    query: &'a str,
    ip: &'a str,
    user_agent: &'a str,
    request_id: &'a str,
}

impl RequestLine<'_> {
    fn render(&self, colorize: bool) -> String {
        if !colorize {
            return format!(
                "[{}] {} {} ({}ms) query={} ip={} user_agent={:?} request_id={}",
                self.status_code,
                self.method,
                self.path,
                self.elapsed_ms,
                self.query,
                self.ip,
                self.user_agent,
                self.request_id,
            );
        }

        let status = self.status_code.to_string();
        let colored_status = match self.status_code {
            200..=299 => status.green(),
            300..=399 => status.yellow(),
            400..=499 => status.bright_red(),
            _ => status.red(),
        };

        let colored_method = match self.method {
            "GET" => self.method.blue(),
            "POST" => self.method.yellow(),
            "PUT" => self.method.purple(),
            "DELETE" => self.method.red(),
            _ => self.method.normal(),
        };

        format!(
            "[{}] {} {} {} query={} ip={} user_agent={:?} request_id={}",
            colored_status,
            colored_method,
            self.path.bright_white(),
            format!("({}ms)", self.elapsed_ms).bright_black(),
            self.query.bright_cyan(),
            self.ip,
            self.user_agent,
            self.request_id,
        )
    }
}

fn level_for_status(status_code: u16) -> Level {
    match status_code {
        500.. => Level::Error,
        400..=499 => Level::Warn,
        _ => Level::Info,
    }
}
