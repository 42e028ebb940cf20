//! Wire types shared across the domain services.
//!
//! Field names follow the backend contract; amounts are Chilean pesos and
//! arrive either as JSON numbers or as decimal strings depending on the
//! serializer, so money fields go through [`clp_amount`].

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Account role. `admin` is exempt from debt blocking; `public` is the
/// only role allowed to start a standalone matriculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Public,
    Apoderado,
    Admin,
    Entrenador,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Public => "public",
            UserRole::Apoderado => "apoderado",
            UserRole::Admin => "admin",
            UserRole::Entrenador => "entrenador",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "public" => Some(UserRole::Public),
            "apoderado" => Some(UserRole::Apoderado),
            "admin" => Some(UserRole::Admin),
            "entrenador" => Some(UserRole::Entrenador),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile snapshot of the logged-in account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rut: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(default, rename = "fechaNacimiento", skip_serializing_if = "Option::is_none")]
    pub fecha_nacimiento: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocupacion: Option<String>,
    #[serde(default, rename = "emergencyContact", skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    #[serde(default, rename = "emergencyPhone", skip_serializing_if = "Option::is_none")]
    pub emergency_phone: Option<String>,
    #[serde(default, rename = "createdAt")]
    pub created_at: String,
    #[serde(default, rename = "customRole", skip_serializing_if = "Option::is_none")]
    pub custom_role: Option<String>,
}

// ---------------------------------------------------------------------------
// Auth payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Token pair plus profile returned by login and register.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthTokens {
    pub access: String,
    pub refresh: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Partial profile update. Only `Some` fields are sent and merged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rut: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(rename = "fechaNacimiento", skip_serializing_if = "Option::is_none")]
    pub fecha_nacimiento: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocupacion: Option<String>,
    #[serde(rename = "emergencyContact", skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    #[serde(rename = "emergencyPhone", skip_serializing_if = "Option::is_none")]
    pub emergency_phone: Option<String>,
}

impl ProfileUpdate {
    /// Merge this partial into a cached user snapshot.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(v) = &self.name {
            user.name = v.clone();
        }
        if let Some(v) = &self.phone {
            user.phone = Some(v.clone());
        }
        if let Some(v) = &self.rut {
            user.rut = Some(v.clone());
        }
        if let Some(v) = &self.direccion {
            user.direccion = Some(v.clone());
        }
        if let Some(v) = &self.fecha_nacimiento {
            user.fecha_nacimiento = Some(v.clone());
        }
        if let Some(v) = &self.ocupacion {
            user.ocupacion = Some(v.clone());
        }
        if let Some(v) = &self.emergency_contact {
            user.emergency_contact = Some(v.clone());
        }
        if let Some(v) = &self.emergency_phone {
            user.emergency_phone = Some(v.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

/// Outstanding charge owed by the account. Overdue age is measured from
/// `fecha_vencimiento`; paid debts never contribute to blocking.
#[derive(Debug, Clone, Deserialize)]
pub struct Debt {
    pub id: i64,
    #[serde(default)]
    pub concepto: Option<String>,
    #[serde(default, deserialize_with = "clp_amount_opt")]
    pub monto: Option<i64>,
    #[serde(default)]
    pub fecha_vencimiento: Option<NaiveDate>,
    #[serde(default)]
    pub estado: Option<String>,
}

impl Debt {
    pub fn is_paid(&self) -> bool {
        self.estado.as_deref() == Some("pagado")
    }
}

/// Scheduled recurring charge (monthly dues and the like).
#[derive(Debug, Clone, Deserialize)]
pub struct Obligation {
    pub id: i64,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default, deserialize_with = "clp_amount_opt")]
    pub monto: Option<i64>,
    #[serde(default)]
    pub fecha_vencimiento: Option<NaiveDate>,
    #[serde(default)]
    pub estado: Option<String>,
}

/// Tokenized card stored server-side for autopay.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedCard {
    pub id: i64,
    #[serde(default)]
    pub marca: Option<String>,
    #[serde(default)]
    pub ultimos_digitos: Option<String>,
    #[serde(default)]
    pub autopago: bool,
    #[serde(default)]
    pub por_defecto: bool,
}

#[derive(Debug, Serialize)]
pub struct NewCard {
    pub marca: String,
    pub ultimos_digitos: String,
    pub autopago: bool,
    pub por_defecto: bool,
}

/// Enrollment period offered for matriculation.
#[derive(Debug, Clone, Deserialize)]
pub struct MatriculaPeriod {
    pub id: i64,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default, deserialize_with = "clp_amount_opt")]
    pub monto: Option<i64>,
    #[serde(default, deserialize_with = "clp_amount_opt")]
    pub costo_matricula: Option<i64>,
}

impl MatriculaPeriod {
    pub fn is_active(&self) -> bool {
        self.estado.as_deref() == Some("activo")
    }

    /// Enrollment cost, whichever field the serializer populated.
    pub fn cost(&self) -> Option<i64> {
        self.monto.or(self.costo_matricula)
    }
}

/// New enrollment submitted before the payment starts.
#[derive(Debug, Clone, Serialize)]
pub struct MatriculaRequest {
    pub atleta_nombre: String,
    pub atleta_rut: String,
    pub atleta_fecha_nacimiento: String,
    pub division: String,
    pub nivel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono_contacto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    pub apoderado_nombre: String,
    pub apoderado_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apoderado_telefono: Option<String>,
    pub monto: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periodo: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MatriculaCreated {
    pub id: i64,
}

/// Redirect target returned by a gateway init: the client POSTs the token
/// to `url` as a top-level form submission.
#[derive(Debug, Clone, Deserialize)]
pub struct WebpayInit {
    pub url: String,
    pub token: String,
}

/// Result of a gateway confirmation. The server may return a refreshed
/// user snapshot (e.g. after a role promotion).
#[derive(Debug, Clone, Deserialize)]
pub struct WebpayConfirmation {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub estado: Option<String>,
}

/// Batch autopay outcome: how many obligations were charged.
#[derive(Debug, Deserialize)]
pub struct AutopayOutcome {
    #[serde(default)]
    pub pagadas: u32,
}

/// Local debt-block override persisted under `configuracionDeuda`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtConfig {
    #[serde(rename = "diasBloqueo")]
    pub dias_bloqueo: i64,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub id: i64,
    pub nombre: String,
    #[serde(deserialize_with = "clp_amount")]
    pub precio: i64,
    #[serde(default)]
    pub categoria: Option<String>,
    #[serde(default)]
    pub nivel_acceso: Option<String>,
    #[serde(default)]
    pub imagen_principal: Option<String>,
}

impl Product {
    /// Exclusive products require at least one active athlete.
    pub fn is_exclusive(&self) -> bool {
        self.nivel_acceso.as_deref() == Some("exclusivo")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartVariant {
    #[serde(default)]
    pub nombre: Option<String>,
}

/// One server-side cart line as the cart endpoint returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItemPayload {
    pub id: i64,
    pub producto: i64,
    #[serde(default)]
    pub producto_nombre: Option<String>,
    #[serde(default, deserialize_with = "clp_amount_opt")]
    pub subtotal: Option<i64>,
    #[serde(default = "default_quantity")]
    pub cantidad: u32,
    #[serde(default)]
    pub variante: Option<CartVariant>,
    #[serde(default)]
    pub imagen: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartPayload {
    #[serde(default)]
    pub items: Vec<CartItemPayload>,
}

/// Store order created from the cart; payment happens through the
/// gateway redirect afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub id: i64,
    #[serde(default, deserialize_with = "clp_amount_opt")]
    pub total: Option<i64>,
    #[serde(default)]
    pub estado: Option<String>,
}

// ---------------------------------------------------------------------------
// Athletes, schedules, notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Athlete {
    pub id: i64,
    pub nombre: String,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub nivel: Option<String>,
    #[serde(default)]
    pub estado: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleEntry {
    pub id: i64,
    #[serde(default)]
    pub dia: Option<String>,
    #[serde(default)]
    pub hora_inicio: Option<String>,
    #[serde(default)]
    pub hora_fin: Option<String>,
    #[serde(default)]
    pub equipo_nombre: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub titulo: String,
    #[serde(default)]
    pub mensaje: Option<String>,
    #[serde(default)]
    pub leida: bool,
}

// ---------------------------------------------------------------------------
// Amount coercion
// ---------------------------------------------------------------------------

/// Accept a peso amount as a JSON number or a decimal string.
pub fn clp_amount<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(v) => Ok(v),
        Raw::Float(v) => Ok(v as i64),
        Raw::Text(s) => s
            .parse::<f64>()
            .map(|v| v as i64)
            .map_err(serde::de::Error::custom),
    }
}

fn clp_amount_opt<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "clp_amount")] i64);

    Option::<Wrapper>::deserialize(deserializer).map(|opt| opt.map(|w| w.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in ["public", "apoderado", "admin", "entrenador"] {
            assert_eq!(UserRole::from_str(role).unwrap().as_str(), role);
        }
        assert_eq!(UserRole::from_str("root"), None);
    }

    #[test]
    fn test_user_deserializes_camel_case_fields() {
        let user: User = serde_json::from_str(
            r#"{
                "id": "1",
                "email": "a@b.com",
                "name": "Ana",
                "role": "apoderado",
                "fechaNacimiento": "1990-04-01",
                "emergencyContact": "Luis",
                "createdAt": "2025-01-01T00:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(user.role, UserRole::Apoderado);
        assert_eq!(user.fecha_nacimiento.as_deref(), Some("1990-04-01"));
        assert_eq!(user.emergency_contact.as_deref(), Some("Luis"));
    }

    #[test]
    fn test_amounts_accept_numbers_and_decimal_strings() {
        let debt: Debt = serde_json::from_str(
            r#"{"id": 1, "monto": "45000.00", "fecha_vencimiento": "2026-07-01"}"#,
        )
        .unwrap();
        assert_eq!(debt.monto, Some(45000));

        let product: Product =
            serde_json::from_str(r#"{"id": 2, "nombre": "Polera", "precio": 12990}"#).unwrap();
        assert_eq!(product.precio, 12990);
    }

    #[test]
    fn test_profile_update_merges_only_some_fields() {
        let mut user: User = serde_json::from_str(
            r#"{"id":"1","email":"a@b.com","name":"Ana","role":"public","createdAt":""}"#,
        )
        .unwrap();
        let update = ProfileUpdate {
            phone: Some("+56911111111".to_string()),
            ..Default::default()
        };
        update.apply_to(&mut user);
        assert_eq!(user.name, "Ana");
        assert_eq!(user.phone.as_deref(), Some("+56911111111"));
    }

    #[test]
    fn test_period_cost_prefers_monto() {
        let period: MatriculaPeriod =
            serde_json::from_str(r#"{"id":1,"estado":"activo","monto":50000}"#).unwrap();
        assert!(period.is_active());
        assert_eq!(period.cost(), Some(50000));

        let legacy: MatriculaPeriod =
            serde_json::from_str(r#"{"id":2,"costo_matricula":"40000"}"#).unwrap();
        assert_eq!(legacy.cost(), Some(40000));
    }
}
