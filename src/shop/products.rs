use serde::{Deserialize, Serialize};

use super::{tiles_for_prefix, AdminScreen, Tile};
use crate::listing::{
  Capability, FieldKind, FilterField, FilterValue, Listable, Stats, StockBand, StockLevel,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProductField {
  Search,
  Category,
  Featured,
  Stock,
  /// `activo` / `inactivo`
  Status,
}

impl FilterField for ProductField {
  fn name(&self) -> &'static str {
    match self {
      ProductField::Search => "busqueda",
      ProductField::Category => "categoria",
      ProductField::Featured => "destacado",
      ProductField::Stock => "stock",
      ProductField::Status => "estado",
    }
  }

  fn kind(&self) -> FieldKind {
    match self {
      ProductField::Search => FieldKind::Search,
      ProductField::Category | ProductField::Status => FieldKind::Exact,
      ProductField::Featured => FieldKind::Flag,
      ProductField::Stock => FieldKind::StockBand,
    }
  }

  fn capability(&self) -> Capability {
    match self {
      ProductField::Search | ProductField::Category => Capability::Server,
      _ => Capability::Local,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: u64,
  pub nombre: String,
  pub sku: String,
  pub categoria: String,
  pub precio: f64,
  pub stock: i64,
  pub stock_minimo: i64,
  #[serde(default)]
  pub destacado: bool,
  #[serde(default = "active")]
  pub activo: bool,
}

fn active() -> bool {
  true
}

impl Product {
  pub fn status_label(&self) -> &'static str {
    if self.activo {
      "activo"
    } else {
      "inactivo"
    }
  }

  fn level(&self) -> StockLevel {
    StockLevel {
      on_hand: self.stock,
      minimum: self.stock_minimo,
    }
  }
}

impl Listable for Product {
  type Field = ProductField;

  fn id(&self) -> u64 {
    self.id
  }

  fn exact(&self, field: ProductField) -> Option<&str> {
    match field {
      ProductField::Category => Some(&self.categoria),
      ProductField::Status => Some(self.status_label()),
      _ => None,
    }
  }

  fn flag(&self, field: ProductField) -> Option<bool> {
    match field {
      ProductField::Featured => Some(self.destacado),
      _ => None,
    }
  }

  fn stock(&self) -> Option<StockLevel> {
    Some(self.level())
  }

  fn search_text(&self) -> Vec<&str> {
    vec![self.nombre.as_str(), self.sku.as_str()]
  }

  fn summarize(items: &[Self]) -> Stats {
    let mut stats = Stats::with_total(items.len());
    stats.count_where(items, "destacados", |p| p.destacado);
    for band in [StockBand::OutOfStock, StockBand::Low] {
      stats.count_where(items, &format!("stock.{}", band.param()), |p| {
        p.level().band() == Some(band)
      });
    }
    stats.tally(items, "categoria", |p| Some(p.categoria.as_str()));
    stats
  }
}

impl AdminScreen for Product {
  const TITLE: &'static str = "Products";
  const RESOURCE: &'static str = "productos";

  fn search_field() -> ProductField {
    ProductField::Search
  }

  fn tiles(stats: &Stats) -> Vec<Tile<ProductField>> {
    let mut tiles = vec![
      Tile::new("Total", "total"),
      Tile::new("Featured", "destacados").toggles(ProductField::Featured, FilterValue::Flag(true)),
      Tile::new("Out of stock", "stock.sin_stock")
        .toggles(ProductField::Stock, FilterValue::Stock(StockBand::OutOfStock)),
      Tile::new("Low stock", "stock.stock_bajo")
        .toggles(ProductField::Stock, FilterValue::Stock(StockBand::Low)),
    ];
    tiles.extend(tiles_for_prefix(stats, "categoria", ProductField::Category));
    tiles
  }

  fn headers() -> &'static [&'static str] {
    &["SKU", "Name", "Category", "Price", "Stock", "Featured", "Status"]
  }

  fn cells(&self) -> Vec<String> {
    vec![
      self.sku.clone(),
      self.nombre.clone(),
      self.categoria.clone(),
      format!("{:.2}", self.precio),
      format!("{}/{}", self.stock, self.stock_minimo),
      if self.destacado { "★" } else { "" }.to_string(),
      self.status_label().to_string(),
    ]
  }

  fn status(&self) -> Option<&str> {
    Some(self.status_label())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::listing::{apply_filters, decide, normalize, Strategy};

  fn product(id: u64, categoria: &str, stock: i64, destacado: bool) -> Product {
    Product {
      id,
      nombre: format!("Producto {}", id),
      sku: format!("SKU-{}", id),
      categoria: categoria.to_string(),
      precio: 19.99,
      stock,
      stock_minimo: 5,
      destacado,
      activo: true,
    }
  }

  fn catalog() -> Vec<Product> {
    vec![
      product(1, "ropa", 0, true),
      product(2, "ropa", 3, false),
      product(3, "hogar", 5, true),
      product(4, "hogar", 40, false),
      product(5, "juguetes", 0, false),
    ]
  }

  #[test]
  fn test_summarize_keys() {
    let stats = Product::summarize(&catalog());
    assert_eq!(stats.total(), 5);
    assert_eq!(stats.get("destacados"), 2);
    assert_eq!(stats.get("stock.sin_stock"), 2);
    assert_eq!(stats.get("stock.stock_bajo"), 2);
    assert_eq!(stats.get("categoria.ropa"), 2);
    assert_eq!(stats.get("categoria.juguetes"), 1);
  }

  #[test]
  fn test_category_is_server_native() {
    let set = normalize(vec![
      (ProductField::Search, FilterValue::text("camisa")),
      (ProductField::Category, FilterValue::text("ropa")),
    ]);
    assert_eq!(decide(&set), Strategy::Remote);

    let mut local = set.clone();
    local.set(ProductField::Featured, FilterValue::Flag(true));
    assert_eq!(decide(&local), Strategy::Local);
    assert_eq!(local.server_fingerprint(), set);
  }

  #[test]
  fn test_featured_and_low_stock() {
    let filters = normalize(vec![
      (ProductField::Featured, FilterValue::Flag(true)),
      (ProductField::Stock, FilterValue::Stock(StockBand::Low)),
    ]);
    let ids: Vec<u64> = apply_filters(&catalog(), &filters).iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![3]);
  }

  #[test]
  fn test_inactive_status_filter() {
    let mut items = catalog();
    items[1].activo = false;
    let filters = normalize(vec![(ProductField::Status, FilterValue::text("inactivo"))]);
    let ids: Vec<u64> = apply_filters(&items, &filters).iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![2]);
  }

  #[test]
  fn test_category_tiles_follow_stats() {
    let tiles = Product::tiles(&Product::summarize(&catalog()));
    let categories: Vec<&str> = tiles
      .iter()
      .filter(|t| t.stat.starts_with("categoria."))
      .map(|t| t.label.as_str())
      .collect();
    assert_eq!(categories, vec!["hogar", "juguetes", "ropa"]);
  }

  #[test]
  fn test_deserialize_defaults() {
    let json = r#"{"id":1,"nombre":"Taza","sku":"T-1","categoria":"hogar",
      "precio":4.5,"stock":12,"stockMinimo":3}"#;
    let product: Product = serde_json::from_str(json).unwrap();
    assert!(product.activo);
    assert!(!product.destacado);
  }
}
