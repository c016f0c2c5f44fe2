use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use super::{tiles_for_prefix, AdminScreen, Tile};
use crate::listing::{Capability, FieldKind, FilterField, Listable, Stats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UserField {
  Search,
  Role,
  AccountType,
  Registered,
}

impl FilterField for UserField {
  fn name(&self) -> &'static str {
    match self {
      UserField::Search => "busqueda",
      UserField::Role => "rol",
      UserField::AccountType => "tipoCuenta",
      UserField::Registered => "fechaRegistro",
    }
  }

  fn kind(&self) -> FieldKind {
    match self {
      UserField::Search => FieldKind::Search,
      UserField::Role | UserField::AccountType => FieldKind::Exact,
      UserField::Registered => FieldKind::DateRange,
    }
  }

  fn capability(&self) -> Capability {
    match self {
      UserField::Search | UserField::Role => Capability::Server,
      UserField::AccountType | UserField::Registered => Capability::Local,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: u64,
  pub nombre: String,
  pub apellido: String,
  pub email: String,
  pub rol: String,
  pub tipo_cuenta: String,
  pub fecha_registro: DateTime<Utc>,
}

impl Listable for User {
  type Field = UserField;

  fn id(&self) -> u64 {
    self.id
  }

  fn exact(&self, field: UserField) -> Option<&str> {
    match field {
      UserField::Role => Some(&self.rol),
      UserField::AccountType => Some(&self.tipo_cuenta),
      _ => None,
    }
  }

  fn timestamp(&self, field: UserField) -> Option<DateTime<Utc>> {
    match field {
      UserField::Registered => Some(self.fecha_registro),
      _ => None,
    }
  }

  fn search_text(&self) -> Vec<&str> {
    vec![self.nombre.as_str(), self.apellido.as_str(), self.email.as_str()]
  }

  fn summarize(items: &[Self]) -> Stats {
    let mut stats = Stats::with_total(items.len());
    stats.tally(items, "rol", |u| Some(u.rol.as_str()));
    stats.tally(items, "tipoCuenta", |u| Some(u.tipo_cuenta.as_str()));
    stats
  }
}

impl AdminScreen for User {
  const TITLE: &'static str = "Users";
  const RESOURCE: &'static str = "usuarios";

  fn search_field() -> UserField {
    UserField::Search
  }

  fn tiles(stats: &Stats) -> Vec<Tile<UserField>> {
    let mut tiles = vec![Tile::new("Total", "total")];
    tiles.extend(tiles_for_prefix(stats, "rol", UserField::Role));
    tiles.extend(tiles_for_prefix(stats, "tipoCuenta", UserField::AccountType));
    tiles
  }

  fn headers() -> &'static [&'static str] {
    &["Name", "Email", "Role", "Account", "Registered"]
  }

  fn cells(&self) -> Vec<String> {
    vec![
      format!("{} {}", self.nombre, self.apellido),
      self.email.clone(),
      self.rol.clone(),
      self.tipo_cuenta.clone(),
      self
        .fecha_registro
        .with_timezone(&Local)
        .format("%Y-%m-%d")
        .to_string(),
    ]
  }
}
