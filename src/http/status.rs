//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! El servidor solo conoce un conjunto cerrado de códigos:
//!
//! - **1xx**: 100 Continue (definido, ningún handler lo usa)
//! - **2xx**: 200 OK
//! - **3xx**: 300 Multiple Choices (definido, sin uso)
//! - **4xx**: 400, 404
//! - **5xx**: 500, 501
//!
//! Cualquier otro valor numérico se rechaza al construir el código.

use thiserror::Error;

/// Representa los códigos de estado HTTP que soporta nuestro servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 100 Continue
    Continue = 100,

    /// 200 OK - La petición fue exitosa
    Ok = 200,

    /// 300 Multiple Choices
    MultipleChoices = 300,

    /// 400 Bad Request - Request line o URI malformados
    BadRequest = 400,

    /// 404 Not Found - Ni handler ni archivo estático
    NotFound = 404,

    /// 500 Internal Server Error - Falló el handler o el decoding
    InternalServerError = 500,

    /// 501 Not Implemented - Método no soportado
    NotImplemented = 501,
}

/// Código numérico fuera del conjunto soportado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unsupported status code: {0}")]
pub struct InvalidStatusCode(pub u16);

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use simple_web_server::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// # Ejemplo
    /// ```
    /// use simple_web_server::http::StatusCode;
    /// assert_eq!(StatusCode::NotImplemented.reason_phrase(), "Not Implemented");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Continue => "Continue",
            StatusCode::Ok => "OK",
            StatusCode::MultipleChoices => "Multiple Choices",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
        }
    }

    /// Verifica si el código indica error del cliente (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    /// Verifica si el código indica error del servidor (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl TryFrom<u16> for StatusCode {
    type Error = InvalidStatusCode;

    /// # Ejemplo
    /// ```
    /// use simple_web_server::http::StatusCode;
    /// assert_eq!(StatusCode::try_from(404), Ok(StatusCode::NotFound));
    /// assert!(StatusCode::try_from(418).is_err());
    /// ```
    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            100 => Ok(StatusCode::Continue),
            200 => Ok(StatusCode::Ok),
            300 => Ok(StatusCode::MultipleChoices),
            400 => Ok(StatusCode::BadRequest),
            404 => Ok(StatusCode::NotFound),
            500 => Ok(StatusCode::InternalServerError),
            501 => Ok(StatusCode::NotImplemented),
            other => Err(InvalidStatusCode(other)),
        }
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
