//! # Archivos Estáticos
//! src/router/static_files.rs
//!
//! Último recurso del router: `{root}/{path sin '/' inicial}`. Los paths
//! con `..` (o absolutos) nunca resuelven fuera de la raíz.

use crate::http::Response;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Raíz de archivos estáticos
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Mapea el path del request a un archivo existente bajo la raíz
    ///
    /// # Ejemplo
    /// ```
    /// use simple_web_server::router::StaticFiles;
    ///
    /// let files = StaticFiles::new("static");
    /// assert!(files.lookup("/../Cargo.toml").is_none());
    /// ```
    pub fn lookup(&self, url_path: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        let mut pushed = false;
        for component in Path::new(url_path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => {
                    path.push(part);
                    pushed = true;
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
        if pushed && path.is_file() {
            Some(path)
        } else {
            None
        }
    }

    /// Escribe el archivo en la respuesta con su `Content-Type`
    pub fn serve(file: &Path, response: &mut Response) -> io::Result<()> {
        let bytes = fs::read(file)?;
        response.set_content_type(content_type(file));
        response.set_body(bytes);
        Ok(())
    }
}

/// Tipo MIME según la extensión
pub fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    match extension.as_str() {
        "txt" => "text/plain",
        "html" => "text/html",
        "jpg" => "image/jpeg",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "css" => "text/css",
        "js" => "application/javascript",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn root_with_files() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("hello.txt"), "Hello\n").unwrap();
        fs::create_dir(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("css").join("site.css"), "body {}").unwrap();
        dir
    }

    #[test]
    fn test_lookup_existing_file() {
        let dir = root_with_files();
        let files = StaticFiles::new(dir.path());

        assert_eq!(files.lookup("/hello.txt"), Some(dir.path().join("hello.txt")));
        assert_eq!(
            files.lookup("/css/site.css"),
            Some(dir.path().join("css").join("site.css"))
        );
    }

    #[test]
    fn test_lookup_rejects_missing_and_directories() {
        let dir = root_with_files();
        let files = StaticFiles::new(dir.path());

        assert!(files.lookup("/nope.txt").is_none());
        assert!(files.lookup("/css").is_none());
        assert!(files.lookup("/").is_none());
    }

    #[test]
    fn test_lookup_prevents_traversal() {
        let dir = root_with_files();
        let inner = StaticFiles::new(dir.path().join("css"));

        assert!(inner.lookup("/../hello.txt").is_none());
        assert!(inner.lookup("/./../../hello.txt").is_none());
    }

    #[test]
    fn test_serve_sets_content_type() {
        let dir = root_with_files();
        let mut response = Response::new();
        StaticFiles::serve(&dir.path().join("hello.txt"), &mut response).unwrap();

        assert_eq!(response.header("Content-Type"), Some("text/plain"));
        assert_eq!(response.body(), b"Hello\n");
    }

    #[test]
    fn test_content_type_table() {
        assert_eq!(content_type(Path::new("a.HTML")), "text/html");
        assert_eq!(content_type(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(content_type(Path::new("a.pdf")), "application/pdf");
        assert_eq!(content_type(Path::new("a.png")), "image/png");
        assert_eq!(content_type(Path::new("a.js")), "application/javascript");
        assert_eq!(content_type(Path::new("a.json")), "application/octet-stream");
        assert_eq!(content_type(Path::new("README")), "application/octet-stream");
    }
}
