//! # Cookies
//! src/http/cookie.rs
//!
//! Cookie de salida. Se serializa como:
//!
//! ```text
//! Set-Cookie: name=value;Max-Age=n;DOMAIN=d;PATH=p
//! ```
//!
//! Los segmentos opcionales se omiten cuando no están definidos
//! (`max_age == 0` significa "sin Max-Age").

/// Cookie inmutable que el handler agrega a la respuesta
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
    max_age: u64,
    domain: Option<String>,
    path: Option<String>,
}

impl Cookie {
    /// Crea una cookie sin atributos
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            max_age: 0,
            domain: None,
            path: None,
        }
    }

    /// Copia de la cookie con `Max-Age` en segundos
    pub fn with_max_age(mut self, seconds: u64) -> Self {
        self.max_age = seconds;
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn max_age(&self) -> u64 {
        self.max_age
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Valor del header `Set-Cookie` (sin el nombre del header)
    ///
    /// # Ejemplo
    /// ```
    /// use simple_web_server::http::Cookie;
    ///
    /// let cookie = Cookie::new("tasty", "strawberry").with_max_age(1).with_path("/");
    /// assert_eq!(cookie.header_value(), "tasty=strawberry;Max-Age=1;PATH=/");
    /// ```
    pub fn header_value(&self) -> String {
        let mut line = format!("{}={}", self.name, self.value);
        if self.max_age != 0 {
            line.push_str(&format!(";Max-Age={}", self.max_age));
        }
        if let Some(domain) = &self.domain {
            line.push_str(&format!(";DOMAIN={}", domain));
        }
        if let Some(path) = &self.path {
            line.push_str(&format!(";PATH={}", path));
        }
        line
    }
}
