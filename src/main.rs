//! # Simple Web Server - Entry Point
//! src/main.rs
//!
//! Servidor de demostración: registra algunos handlers de ejemplo y atiende
//! hasta que se mata el proceso.

use clap::Parser;
use simple_web_server::config::Config;
use simple_web_server::error::{HandlerError, ServerError};
use simple_web_server::http::{Cookie, Method, Request, Response, StatusCode};
use simple_web_server::logging;
use simple_web_server::router::Router;
use simple_web_server::server::Server;
use std::fmt::Write;

fn main() {
    println!("=================================");
    println!("  Simple Web Server (HTTP/1.0)");
    println!("=================================\n");

    let config = Config::parse();
    logging::init(&config.log_level);
    config.print_summary();

    if let Err(e) = run(config) {
        eprintln!("💥 Error fatal: {}", e);
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<(), ServerError> {
    let server = Server::start(config, demo_router()?)?;
    println!("[+] Servidor escuchando en {}", server.local_addr());
    server.wait();
    Ok(())
}

/// Rutas de ejemplo
fn demo_router() -> Result<Router, ServerError> {
    let mut router = Router::new();

    router.register_methods("/index", &[Method::GET, Method::HEAD], index_handler)?;
    router.register_methods("/index/ifmo", &[Method::GET], cookies_handler)?;
    router.register("/echo", echo_handler)?;
    router.register("/form", form_handler)?;
    router.register("/session/open", session_open_handler)?;
    router.register("/session/check", session_check_handler)?;
    router.register("/fail", |_req: &Request, _res: &mut Response| {
        Err("fallo intencional".into())
    })?;
    router.register("/dispatcher", dispatcher_handler)?;

    router.set_dispatcher(|req: &Request, _res: &mut Response| {
        (req.path() == "/dispatch").then(|| "/dispatcher".to_string())
    });

    Ok(router)
}

// === Handlers ===

fn index_handler(_req: &Request, res: &mut Response) -> Result<(), HandlerError> {
    res.set_header("HELLO", "WORLD!");
    res.set_status(StatusCode::Ok);
    res.set_content_type("text/plain; charset=utf-8");
    let mut body = res.writer();
    body.write_str("Hola Mundo!\r\n")?;
    body.write_str("Adiós!\r\n")?;
    Ok(())
}

fn cookies_handler(_req: &Request, res: &mut Response) -> Result<(), HandlerError> {
    res.set_header("FIRST", "HANDLER!");
    res.set_content_type("text/plain; charset=utf-8");
    res.add_cookie(Cookie::new("tasty", "strawberry").with_max_age(1));
    res.add_cookie(Cookie::new("yummy", "choco").with_max_age(1));
    res.write_text("Cookies enviadas\r\n");
    Ok(())
}

/// Devuelve el argumento `a`
fn echo_handler(req: &Request, res: &mut Response) -> Result<(), HandlerError> {
    res.set_content_type("text/plain");
    res.write_text(req.argument("a").unwrap_or(""));
    Ok(())
}

/// Devuelve el campo `x` del formulario
fn form_handler(req: &Request, res: &mut Response) -> Result<(), HandlerError> {
    res.set_content_type("text/plain");
    res.write_text(req.argument("x").unwrap_or(""));
    Ok(())
}

fn session_open_handler(req: &Request, _res: &mut Response) -> Result<(), HandlerError> {
    let session = req.session_with(true)?;
    session.set("login", &req.argument("login"))?;
    Ok(())
}

fn session_check_handler(req: &Request, res: &mut Response) -> Result<(), HandlerError> {
    let login = req.session()?.get::<Option<String>>("login").flatten();
    res.write_text(login.as_deref().unwrap_or(" "));
    Ok(())
}

fn dispatcher_handler(_req: &Request, res: &mut Response) -> Result<(), HandlerError> {
    res.set_header("HELLO", "DISPATCHER!");
    res.set_content_type("text/plain; charset=utf-8");
    write!(res.writer(), "HELLO DISPATCHER!\r\n")?;
    Ok(())
}
