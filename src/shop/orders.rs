use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use super::{AdminScreen, Tile};
use crate::listing::{Capability, FieldKind, FilterField, FilterValue, Listable, Stats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OrderField {
  Search,
  Status,
  PaymentMethod,
  ShippingMethod,
  Date,
}

impl FilterField for OrderField {
  fn name(&self) -> &'static str {
    match self {
      OrderField::Search => "busqueda",
      OrderField::Status => "estado",
      OrderField::PaymentMethod => "metodoPago",
      OrderField::ShippingMethod => "metodoEnvio",
      OrderField::Date => "fecha",
    }
  }

  fn kind(&self) -> FieldKind {
    match self {
      OrderField::Search => FieldKind::Search,
      OrderField::Status | OrderField::PaymentMethod | OrderField::ShippingMethod => {
        FieldKind::Exact
      }
      OrderField::Date => FieldKind::DateRange,
    }
  }

  fn capability(&self) -> Capability {
    match self {
      OrderField::Search => Capability::Server,
      _ => Capability::Local,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
  Pendiente,
  Pagado,
  Enviado,
  Entregado,
  Cancelado,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 5] = [
    OrderStatus::Pendiente,
    OrderStatus::Pagado,
    OrderStatus::Enviado,
    OrderStatus::Entregado,
    OrderStatus::Cancelado,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pendiente => "PENDIENTE",
      OrderStatus::Pagado => "PAGADO",
      OrderStatus::Enviado => "ENVIADO",
      OrderStatus::Entregado => "ENTREGADO",
      OrderStatus::Cancelado => "CANCELADO",
    }
  }

  /// Fulfilment order; delivered and cancelled orders are final.
  pub fn next(&self) -> Option<OrderStatus> {
    match self {
      OrderStatus::Pendiente => Some(OrderStatus::Pagado),
      OrderStatus::Pagado => Some(OrderStatus::Enviado),
      OrderStatus::Enviado => Some(OrderStatus::Entregado),
      OrderStatus::Entregado | OrderStatus::Cancelado => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
  pub nombre: String,
  pub apellido: String,
  pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: u64,
  pub numero_pedido: String,
  pub cliente: Customer,
  pub estado: OrderStatus,
  pub metodo_pago: String,
  pub metodo_envio: String,
  pub total: f64,
  pub fecha: DateTime<Utc>,
}

impl Listable for Order {
  type Field = OrderField;

  fn id(&self) -> u64 {
    self.id
  }

  fn exact(&self, field: OrderField) -> Option<&str> {
    match field {
      OrderField::Status => Some(self.estado.as_str()),
      OrderField::PaymentMethod => Some(&self.metodo_pago),
      OrderField::ShippingMethod => Some(&self.metodo_envio),
      _ => None,
    }
  }

  fn timestamp(&self, field: OrderField) -> Option<DateTime<Utc>> {
    match field {
      OrderField::Date => Some(self.fecha),
      _ => None,
    }
  }

  fn search_text(&self) -> Vec<&str> {
    vec![
      self.numero_pedido.as_str(),
      self.cliente.nombre.as_str(),
      self.cliente.apellido.as_str(),
      self.cliente.email.as_str(),
    ]
  }

  fn summarize(items: &[Self]) -> Stats {
    let mut stats = Stats::with_total(items.len());
    for status in OrderStatus::ALL {
      stats.count_where(items, &format!("estado.{}", status.as_str()), |o| o.estado == status);
    }
    stats
  }
}

impl AdminScreen for Order {
  const TITLE: &'static str = "Orders";
  const RESOURCE: &'static str = "pedidos";

  fn search_field() -> OrderField {
    OrderField::Search
  }

  fn tiles(_stats: &Stats) -> Vec<Tile<OrderField>> {
    let mut tiles = vec![Tile::new("Total", "total")];
    tiles.extend(OrderStatus::ALL.iter().map(|status| {
      Tile::new(status.as_str(), format!("estado.{}", status.as_str()))
        .toggles(OrderField::Status, FilterValue::text(status.as_str()))
    }));
    tiles
  }

  fn headers() -> &'static [&'static str] {
    &["Order", "Customer", "Status", "Payment", "Shipping", "Total", "Date"]
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.numero_pedido.clone(),
      format!("{} {}", self.cliente.nombre, self.cliente.apellido),
      self.estado.as_str().to_string(),
      self.metodo_pago.clone(),
      self.metodo_envio.clone(),
      format!("{:.2}", self.total),
      self.fecha.with_timezone(&Local).format("%Y-%m-%d").to_string(),
    ]
  }

  fn status(&self) -> Option<&str> {
    Some(self.estado.as_str())
  }

  fn next_status(&self) -> Option<&'static str> {
    self.estado.next().map(|s| s.as_str())
  }
}
