//! Servicio de facturas PDF
//!
//! Las facturas se componen primero como una lista de bloques (líneas de texto,
//! títulos y filas de tabla) y después se dibujan con printpdf usando las
//! fuentes Helvetica integradas. El texto se limita a ASCII imprimible.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point,
};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Company, MonthlyCompanyInvoice, MonthlyInvoiceType, NewMonthlyInvoiceItem, ServiceDetail,
    ServiceType,
};
use crate::utils::errors::AppError;
use crate::utils::validation::filename_fragment;

/// Anchura útil de las tablas en mm
pub const CONTENT_WIDTH: f32 = 160.0;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const LEFT_MARGIN: f32 = (PAGE_WIDTH - CONTENT_WIDTH) / 2.0;
const BODY_TOP: f32 = 262.0;
const BODY_BOTTOM: f32 = 20.0;
const PT_TO_MM: f32 = 0.352_778;
// Anchura media de un carácter Helvetica en em
const AVG_CHAR_EM: f32 = 0.5;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF rendering failed: {0}")]
    Render(String),

    #[error("Could not write invoice file: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PdfError> for AppError {
    fn from(e: PdfError) -> Self {
        AppError::Internal(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub width: f32,
    pub align: Align,
}

impl Cell {
    pub fn new(text: impl Into<String>, width: f32, align: Align) -> Self {
        Self {
            text: safe_text(&text.into()),
            width,
            align,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text { text: String, weight: Weight },
    Heading(String),
    Row { cells: Vec<Cell>, weight: Weight },
    Space(f32),
}

/// Factura compuesta, independiente del motor de dibujo
#[derive(Debug, Clone)]
pub struct InvoiceDocument {
    pub company_name: String,
    pub title: String,
    pub blocks: Vec<Block>,
}

impl InvoiceDocument {
    pub fn new(company_name: &str, title: &str) -> Self {
        Self {
            company_name: safe_text(company_name),
            title: title.to_string(),
            blocks: Vec::new(),
        }
    }

    fn text(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Text {
            text: safe_text(&text.into()),
            weight: Weight::Regular,
        });
    }

    fn heading(&mut self, text: &str) {
        self.blocks.push(Block::Heading(safe_text(text)));
    }

    fn row(&mut self, cells: Vec<Cell>, weight: Weight) {
        self.blocks.push(Block::Row { cells, weight });
    }

    fn space(&mut self, mm: f32) {
        self.blocks.push(Block::Space(mm));
    }

    /// Todas las cadenas del documento, en orden
    pub fn texts(&self) -> Vec<&str> {
        let mut texts = vec![self.company_name.as_str(), self.title.as_str()];
        for block in &self.blocks {
            match block {
                Block::Text { text, .. } | Block::Heading(text) => texts.push(text),
                Block::Row { cells, .. } => texts.extend(cells.iter().map(|c| c.text.as_str())),
                Block::Space(_) => {}
            }
        }
        texts
    }
}

/// Translitera letras turcas y descarta el resto de caracteres no ASCII
pub fn safe_text(input: &str) -> String {
    input
        .chars()
        .filter_map(|c| match c {
            'İ' => Some('I'),
            'ı' => Some('i'),
            'Ğ' => Some('G'),
            'ğ' => Some('g'),
            'Ü' => Some('U'),
            'ü' => Some('u'),
            'Ş' => Some('S'),
            'ş' => Some('s'),
            'Ö' => Some('O'),
            'ö' => Some('o'),
            'Ç' => Some('C'),
            'ç' => Some('c'),
            c if c.is_ascii_graphic() || c == ' ' => Some(c),
            c if c.is_whitespace() => Some(' '),
            _ => None,
        })
        .collect()
}

pub fn money(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

/// Anchura de columna según el texto más largo, acotada a `[min, max]`
pub fn auto_width<'a>(texts: impl Iterator<Item = &'a str>, min: f32, max: f32) -> f32 {
    let longest = texts.map(|t| t.chars().count()).max().unwrap_or(0);
    (longest as f32 * 2.0).clamp(min, max)
}

/// Escala las columnas para que no superen la anchura útil
pub fn fit_columns(widths: &[f32]) -> Vec<f32> {
    let total: f32 = widths.iter().sum();
    if total <= CONTENT_WIDTH || total <= 0.0 {
        return widths.to_vec();
    }
    let ratio = CONTENT_WIDTH / total;
    widths.iter().map(|w| w * ratio).collect()
}

fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_uppercase()
}

fn date_or_na(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn is_accommodation_type(service_type: &str) -> bool {
    service_type
        .parse::<ServiceType>()
        .map_or(false, |t| t.is_accommodation())
}

// ---------------------------------------------------------------------------
// Factura detallada de cliente
// ---------------------------------------------------------------------------

pub struct ClientInvoiceInput<'a> {
    pub client_id: Uuid,
    pub client_name: &'a str,
    pub email: Option<&'a str>,
    pub invoice_date: NaiveDate,
    pub services: &'a [ServiceDetail],
}

pub fn client_invoice_document(company_name: &str, input: &ClientInvoiceInput<'_>) -> InvoiceDocument {
    let mut doc = InvoiceDocument::new(company_name, "Client Detailed Invoice");
    let arrival = input.services.iter().map(|d| d.service.start_date).min();

    doc.text(format!(
        "Invoice Serial: INV-{}-{}",
        input.invoice_date.format("%Y%m%d"),
        short_id(input.client_id)
    ));
    doc.text(format!("Invoice Date: {}", input.invoice_date.format("%Y-%m-%d")));
    doc.text(format!("Client: {}", input.client_name));
    doc.text(format!("Email: {}", input.email.unwrap_or("No email provided")));
    doc.text(format!("Arrival Date: {}", date_or_na(arrival)));
    doc.space(6.0);
    doc.heading("Service Details");

    if input.services.is_empty() {
        doc.text("No services found for this client.");
        return doc;
    }

    let (hotels, tours): (Vec<&ServiceDetail>, Vec<&ServiceDetail>) = input
        .services
        .iter()
        .partition(|d| d.service.is_accommodation());

    let mut grand_total = Decimal::ZERO;

    if !tours.is_empty() {
        doc.heading("Tours and Car Rentals");
        let has_tour = tours.iter().any(|d| d.service.is_tour());
        if has_tour {
            doc.row(
                vec![
                    Cell::new("Service", 80.0, Align::Left),
                    Cell::new("Date", 40.0, Align::Center),
                    Cell::new("Total Price", 40.0, Align::Right),
                ],
                Weight::Bold,
            );
        } else {
            doc.row(
                vec![
                    Cell::new("Service", 120.0, Align::Left),
                    Cell::new("Total Price", 40.0, Align::Right),
                ],
                Weight::Bold,
            );
        }

        let mut subtotal = Decimal::ZERO;
        for detail in &tours {
            let service = &detail.service;
            let price = service.total_selling_price();
            subtotal += price;
            let mut cells = Vec::with_capacity(3);
            if has_tour {
                cells.push(Cell::new(service.service_name.as_str(), 80.0, Align::Left));
                let date = if service.is_tour() {
                    service.start_date.format("%Y-%m-%d").to_string()
                } else {
                    "-".to_string()
                };
                cells.push(Cell::new(date, 40.0, Align::Center));
            } else {
                cells.push(Cell::new(service.service_name.as_str(), 120.0, Align::Left));
            }
            cells.push(Cell::new(money(price), 40.0, Align::Right));
            doc.row(cells, Weight::Regular);
        }
        doc.row(
            vec![
                Cell::new("Tours/Vehicles Total", 120.0, Align::Left),
                Cell::new(money(subtotal), 40.0, Align::Right),
            ],
            Weight::Bold,
        );
        grand_total += subtotal;
        doc.space(4.0);
    }

    if !hotels.is_empty() {
        doc.heading("Hotels/Bungalows");
        let names: Vec<String> = hotels
            .iter()
            .map(|d| d.service.hotel_name.clone().unwrap_or_else(|| d.service.service_name.clone()))
            .collect();
        let cities: Vec<String> = hotels
            .iter()
            .map(|d| d.service.hotel_city.clone().unwrap_or_else(|| "-".to_string()))
            .collect();

        let widths = fit_columns(&[
            auto_width(names.iter().map(String::as_str), 60.0, 90.0),
            auto_width(cities.iter().map(String::as_str), 30.0, 50.0),
            40.0,
        ]);
        doc.row(
            vec![
                Cell::new("Name", widths[0], Align::Left),
                Cell::new("City", widths[1], Align::Left),
                Cell::new("Total Price", widths[2], Align::Right),
            ],
            Weight::Bold,
        );

        let mut subtotal = Decimal::ZERO;
        for ((detail, name), city) in hotels.iter().zip(&names).zip(&cities) {
            let price = detail.service.total_selling_price();
            subtotal += price;
            doc.row(
                vec![
                    Cell::new(name.as_str(), widths[0], Align::Left),
                    Cell::new(city.as_str(), widths[1], Align::Left),
                    Cell::new(money(price), widths[2], Align::Right),
                ],
                Weight::Regular,
            );
        }
        doc.row(
            vec![
                Cell::new("Hotels Total", widths[0] + widths[1], Align::Left),
                Cell::new(money(subtotal), widths[2], Align::Right),
            ],
            Weight::Bold,
        );
        grand_total += subtotal;
        doc.space(4.0);
    }

    doc.row(
        vec![
            Cell::new("Total Amount", 120.0, Align::Left),
            Cell::new(money(grand_total), 40.0, Align::Right),
        ],
        Weight::Bold,
    );
    doc
}

// ---------------------------------------------------------------------------
// Facturas mensuales de empresa
// ---------------------------------------------------------------------------

/// Totales de un cliente dentro de una factura mensual
#[derive(Debug, Clone, PartialEq)]
pub struct ClientPeriodTotals {
    pub client_name: String,
    pub arrival_date: Option<NaiveDate>,
    pub tours_selling: Decimal,
    pub hotels_selling: Decimal,
    pub tours_cost: Decimal,
    pub hotels_cost: Decimal,
    pub profit: Decimal,
}

impl ClientPeriodTotals {
    fn empty(item: &NewMonthlyInvoiceItem) -> Self {
        Self {
            client_name: item.client_name.clone(),
            arrival_date: item.arrival_date.or(Some(item.service_date)),
            tours_selling: Decimal::ZERO,
            hotels_selling: Decimal::ZERO,
            tours_cost: Decimal::ZERO,
            hotels_cost: Decimal::ZERO,
            profit: Decimal::ZERO,
        }
    }
}

/// Agrupa las líneas por cliente conservando el orden de aparición
pub fn summarize_by_client(items: &[NewMonthlyInvoiceItem]) -> Vec<ClientPeriodTotals> {
    let mut totals: Vec<ClientPeriodTotals> = Vec::new();
    for item in items {
        let index = match totals.iter().position(|t| t.client_name == item.client_name) {
            Some(index) => index,
            None => {
                totals.push(ClientPeriodTotals::empty(item));
                totals.len() - 1
            }
        };
        let entry = &mut totals[index];
        if is_accommodation_type(&item.service_type) {
            entry.hotels_selling += item.selling_price;
            entry.hotels_cost += item.cost_price;
        } else {
            entry.tours_selling += item.selling_price;
            entry.tours_cost += item.cost_price;
        }
        entry.profit += item.profit;
    }
    totals
}

pub struct MonthlyInvoiceInput<'a> {
    pub invoice: &'a MonthlyCompanyInvoice,
    pub company: &'a Company,
    pub items: &'a [NewMonthlyInvoiceItem],
}

/// Serial con el mes de emisión, no el del periodo facturado
fn monthly_serial(prefix: &str, invoice: &MonthlyCompanyInvoice) -> String {
    format!(
        "{}-{}-{}",
        prefix,
        invoice.invoice_date.format("%Y%m"),
        short_id(invoice.id)
    )
}

fn monthly_header(doc: &mut InvoiceDocument, prefix: &str, input: &MonthlyInvoiceInput<'_>) {
    let invoice = input.invoice;
    doc.text(format!("Invoice Serial: {}", monthly_serial(prefix, invoice)));
    doc.text(format!("Invoice Date: {}", invoice.invoice_date.format("%Y-%m-%d")));
    doc.text(format!("Period: {}", invoice.invoice_period()));
    doc.text(format!("Invoice ID: {}", invoice.id));
    doc.space(4.0);
}

pub fn partner_invoice_document(company_name: &str, input: &MonthlyInvoiceInput<'_>) -> InvoiceDocument {
    let mut doc = InvoiceDocument::new(company_name, "Monthly Company Invoice");
    monthly_header(&mut doc, MonthlyInvoiceType::PartnerCompany.serial_prefix(), input);

    doc.heading("Company Information:");
    doc.text(format!("Company: {}", input.company.name));
    doc.text(format!(
        "Contact Person: {}",
        input.company.contact_person.as_deref().unwrap_or("N/A")
    ));
    doc.text(format!("Email: {}", input.company.email.as_deref().unwrap_or("N/A")));
    doc.space(4.0);

    doc.heading("Service Summary by Client");
    let summary = summarize_by_client(input.items);
    let widths = fit_columns(&[
        auto_width(summary.iter().map(|s| s.client_name.as_str()), 50.0, 70.0),
        35.0,
        35.0,
        35.0,
    ]);
    doc.row(
        vec![
            Cell::new("Client", widths[0], Align::Left),
            Cell::new("Arrival Date", widths[1], Align::Center),
            Cell::new("Tours/Vehicles", widths[2], Align::Right),
            Cell::new("Hotels", widths[3], Align::Right),
        ],
        Weight::Bold,
    );

    let (mut tours, mut hotels) = (Decimal::ZERO, Decimal::ZERO);
    for client in &summary {
        tours += client.tours_selling;
        hotels += client.hotels_selling;
        doc.row(
            vec![
                Cell::new(client.client_name.as_str(), widths[0], Align::Left),
                Cell::new(date_or_na(client.arrival_date), widths[1], Align::Center),
                Cell::new(money(client.tours_selling), widths[2], Align::Right),
                Cell::new(money(client.hotels_selling), widths[3], Align::Right),
            ],
            Weight::Regular,
        );
    }
    doc.row(
        vec![
            Cell::new("TOTALS", widths[0] + widths[1], Align::Left),
            Cell::new(money(tours), widths[2], Align::Right),
            Cell::new(money(hotels), widths[3], Align::Right),
        ],
        Weight::Bold,
    );
    doc.space(6.0);
    doc.row(
        vec![
            Cell::new("Total Amount", 120.0, Align::Left),
            Cell::new(money(input.invoice.total_amount), 40.0, Align::Right),
        ],
        Weight::Bold,
    );
    doc
}

pub fn internal_invoice_document(company_name: &str, input: &MonthlyInvoiceInput<'_>) -> InvoiceDocument {
    let mut doc = InvoiceDocument::new(company_name, "My Company Invoice (Internal Report)");
    monthly_header(&mut doc, MonthlyInvoiceType::MyCompany.serial_prefix(), input);
    doc.text(format!("Partner Company: {}", input.company.name));
    doc.space(4.0);

    doc.heading("Cost Analysis Summary by Client");
    let widths = fit_columns(&[50.0, 25.0, 30.0, 30.0, 35.0]);
    doc.row(
        vec![
            Cell::new("Client Name", widths[0], Align::Left),
            Cell::new("Arrival Date", widths[1], Align::Center),
            Cell::new("Tours Cost", widths[2], Align::Right),
            Cell::new("Hotels Cost", widths[3], Align::Right),
            Cell::new("Total Profit", widths[4], Align::Right),
        ],
        Weight::Bold,
    );

    let (mut tours, mut hotels, mut profit) = (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
    for client in summarize_by_client(input.items) {
        tours += client.tours_cost;
        hotels += client.hotels_cost;
        profit += client.profit;
        doc.row(
            vec![
                Cell::new(client.client_name, widths[0], Align::Left),
                Cell::new(date_or_na(client.arrival_date), widths[1], Align::Center),
                Cell::new(money(client.tours_cost), widths[2], Align::Right),
                Cell::new(money(client.hotels_cost), widths[3], Align::Right),
                Cell::new(money(client.profit), widths[4], Align::Right),
            ],
            Weight::Regular,
        );
    }
    doc.row(
        vec![
            Cell::new("TOTALS", widths[0] + widths[1], Align::Left),
            Cell::new(money(tours), widths[2], Align::Right),
            Cell::new(money(hotels), widths[3], Align::Right),
            Cell::new(money(profit), widths[4], Align::Right),
        ],
        Weight::Bold,
    );
    doc.space(6.0);

    let invoice = input.invoice;
    doc.heading("Financial Summary");
    for (label, amount) in [
        ("Total Cost", invoice.total_cost),
        ("Total Revenue", invoice.total_amount),
        ("Total Profit", invoice.total_profit),
    ] {
        doc.row(
            vec![
                Cell::new(label, 120.0, Align::Left),
                Cell::new(money(amount), 40.0, Align::Right),
            ],
            Weight::Bold,
        );
    }
    doc
}

pub fn monthly_invoice_document(
    company_name: &str,
    invoice_type: MonthlyInvoiceType,
    input: &MonthlyInvoiceInput<'_>,
) -> InvoiceDocument {
    match invoice_type {
        MonthlyInvoiceType::PartnerCompany => partner_invoice_document(company_name, input),
        MonthlyInvoiceType::MyCompany => internal_invoice_document(company_name, input),
    }
}

// ---------------------------------------------------------------------------
// Ficheros
// ---------------------------------------------------------------------------

pub fn monthly_invoice_filename(company: &str, month: u32, year: i32, invoice_type: MonthlyInvoiceType) -> String {
    format!(
        "monthly_invoice_{}_{}_{}_{}.pdf",
        filename_fragment(&safe_text(company)),
        month,
        year,
        invoice_type.as_str()
    )
}

pub fn client_invoice_filename(client_name: &str, client_id: Uuid, period: Option<(u32, i32)>) -> String {
    let name = filename_fragment(&safe_text(client_name));
    match period {
        Some((month, year)) => format!("client_invoice_{}_{}_{}.pdf", name, month, year),
        None => format!("client_invoice_{}_{}.pdf", name, short_id(client_id)),
    }
}

pub fn download_path(filename: &str) -> String {
    format!("/api/invoices/download/{}", filename)
}

/// Dibuja el documento y lo guarda en `dir/filename`
pub async fn write_invoice(dir: &Path, filename: &str, doc: &InvoiceDocument) -> Result<PathBuf, PdfError> {
    let bytes = render_pdf(doc)?;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(filename);
    tokio::fs::write(&path, bytes).await?;
    tracing::info!("🧾 Factura PDF generada: {}", path.display());
    Ok(path)
}

// ---------------------------------------------------------------------------
// Dibujo con printpdf
// ---------------------------------------------------------------------------

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_CHAR_EM * PT_TO_MM
}

fn fit_text(text: &str, width: f32, size: f32) -> String {
    let max_chars = ((width - 2.0) / (size * AVG_CHAR_EM * PT_TO_MM)).floor().max(1.0) as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(2)).collect();
    format!("{}..", kept)
}

fn aligned_x(left: f32, width: f32, text: &str, size: f32, align: Align) -> f32 {
    match align {
        Align::Left => left + 1.5,
        Align::Center => left + (width - text_width(text, size)) / 2.0,
        Align::Right => left + width - text_width(text, size) - 1.5,
    }
}

fn segment(points: &[(f32, f32)], closed: bool) -> Line {
    Line {
        points: points
            .iter()
            .map(|(x, y)| (Point::new(Mm(*x), Mm(*y)), false))
            .collect(),
        is_closed: closed,
    }
}

struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    source: &'a InvoiceDocument,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    page: usize,
    y: f32,
}

impl<'a> PageWriter<'a> {
    fn font(&self, weight: Weight) -> &IndirectFontRef {
        match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        }
    }

    fn decorate(&mut self) {
        let doc = self.source;
        self.centered(&doc.company_name, 15.0, 282.0, Weight::Bold);
        self.centered(&doc.title, 12.0, 274.0, Weight::Bold);
        self.layer.set_outline_thickness(0.3);
        self.layer.add_line(segment(
            &[(LEFT_MARGIN, 269.0), (LEFT_MARGIN + CONTENT_WIDTH, 269.0)],
            false,
        ));
        let footer = format!("Page {}", self.page);
        self.centered(&footer, 8.0, 10.0, Weight::Regular);
        self.y = BODY_TOP;
    }

    fn centered(&self, text: &str, size: f32, y: f32, weight: Weight) {
        let x = aligned_x(LEFT_MARGIN, CONTENT_WIDTH, text, size, Align::Center);
        self.layer.use_text(text, size, Mm(x), Mm(y), self.font(weight));
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y - height >= BODY_BOTTOM {
            return;
        }
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.page += 1;
        self.decorate();
    }

    fn line(&mut self, text: &str, size: f32, height: f32, weight: Weight) {
        self.ensure_room(height);
        self.layer.use_text(
            text,
            size,
            Mm(LEFT_MARGIN),
            Mm(self.y - height * 0.7),
            self.font(weight),
        );
        self.y -= height;
    }

    fn row(&mut self, cells: &[Cell], weight: Weight) {
        const HEIGHT: f32 = 8.0;
        const SIZE: f32 = 9.0;
        self.ensure_room(HEIGHT);
        let (top, bottom) = (self.y, self.y - HEIGHT);
        let mut left = LEFT_MARGIN;
        for cell in cells {
            let right = left + cell.width;
            self.layer.add_line(segment(
                &[(left, top), (right, top), (right, bottom), (left, bottom)],
                true,
            ));
            let text = fit_text(&cell.text, cell.width, SIZE);
            let x = aligned_x(left, cell.width, &text, SIZE, cell.align);
            self.layer
                .use_text(text, SIZE, Mm(x), Mm(bottom + 2.6), self.font(weight));
            left = right;
        }
        self.y = bottom;
    }
}

fn render_err<E: std::fmt::Debug>(error: E) -> PdfError {
    PdfError::Render(format!("{:?}", error))
}

/// Dibuja el documento con printpdf y devuelve los bytes del PDF
pub fn render_pdf(source: &InvoiceDocument) -> Result<Vec<u8>, PdfError> {
    let (doc, page, layer) = PdfDocument::new(&source.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(render_err)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(render_err)?;

    {
        let mut writer = PageWriter {
            doc: &doc,
            source,
            layer: doc.get_page(page).get_layer(layer),
            regular,
            bold,
            page: 1,
            y: BODY_TOP,
        };
        writer.decorate();

        for block in &source.blocks {
            match block {
                Block::Text { text, weight } => writer.line(text, 10.0, 6.0, *weight),
                Block::Heading(text) => writer.line(text, 12.0, 9.0, Weight::Bold),
                Block::Row { cells, weight } => writer.row(cells, *weight),
                Block::Space(mm) => writer.y -= *mm,
            }
        }
    }

    doc.save_to_bytes().map_err(render_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::service::fixtures::{detail, service};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn item(client: &str, service_type: &str, cost: Decimal, selling: Decimal) -> NewMonthlyInvoiceItem {
        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        NewMonthlyInvoiceItem {
            service_id: None,
            client_name: client.to_string(),
            arrival_date: Some(date),
            service_type: service_type.to_string(),
            service_name: format!("{} item", service_type),
            service_date: date,
            cost_price: cost,
            selling_price: selling,
            profit: selling - cost,
            nights_or_hours: None,
            city: None,
            hotel_or_tour_name: None,
        }
    }

    fn company() -> Company {
        Company {
            id: Uuid::new_v4(),
            name: "Öz Turizm".to_string(),
            email: Some("info@oz.example".to_string()),
            phone: None,
            address: None,
            contact_person: Some("Ayşe".to_string()),
            logo_path: None,
            created_at: Utc::now(),
        }
    }

    fn monthly(total_amount: Decimal, total_cost: Decimal) -> MonthlyCompanyInvoice {
        MonthlyCompanyInvoice {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            invoice_month: 5,
            invoice_year: 2024,
            total_amount,
            total_cost,
            total_profit: total_amount - total_cost,
            invoice_type: "partner_company".to_string(),
            status: "completed".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            pdf_path: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_safe_text_transliterates_turkish() {
        assert_eq!(safe_text("İstanbul Şişli Çağlayan"), "Istanbul Sisli Caglayan");
        assert_eq!(safe_text("Günaydın 🚗 öğle"), "Gunaydin  ogle");
        assert_eq!(safe_text("tab\there"), "tab here");
    }

    #[test]
    fn test_money_and_columns() {
        assert_eq!(money(dec!(1234.5)), "$1234.50");
        assert_eq!(money(Decimal::ZERO), "$0.00");

        assert_eq!(fit_columns(&[80.0, 40.0, 40.0]), vec![80.0, 40.0, 40.0]);
        let scaled = fit_columns(&[90.0, 50.0, 40.0]);
        let total: f32 = scaled.iter().sum();
        assert!((total - CONTENT_WIDTH).abs() < 0.01);

        assert_eq!(auto_width(["short"].into_iter(), 60.0, 90.0), 60.0);
        let long = "x".repeat(40);
        assert_eq!(auto_width([long.as_str()].into_iter(), 60.0, 90.0), 80.0);
        assert_eq!(auto_width(std::iter::empty(), 30.0, 50.0), 30.0);
    }

    #[test]
    fn test_summarize_by_client_keeps_order_and_buckets() {
        let items = vec![
            item("Zeynep Kaya", "Tour", dec!(40), dec!(60)),
            item("Ali Demir", "Hotel", dec!(100), dec!(150)),
            item("Zeynep Kaya", "Cabin", dec!(70), dec!(90)),
            item("Zeynep Kaya", "Vehicle", dec!(20), dec!(35)),
        ];
        let summary = summarize_by_client(&items);

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].client_name, "Zeynep Kaya");
        assert_eq!(summary[0].tours_selling, dec!(95));
        assert_eq!(summary[0].hotels_selling, dec!(90));
        assert_eq!(summary[0].tours_cost, dec!(60));
        assert_eq!(summary[0].profit, dec!(55));
        assert_eq!(summary[1].hotels_cost, dec!(100));
    }

    #[test]
    fn test_client_document_sections() {
        let client_id = Uuid::new_v4();
        let mut tour = service("Tour");
        tour.selling_price = Some(dec!(50));
        let mut hotel = service("Hotel");
        hotel.hotel_name = Some("Çırağan Palace".to_string());
        hotel.num_nights = Some(2);
        hotel.selling_price_per_night = Some(dec!(100));
        let services = vec![
            detail(tour, client_id, "Mehmet Yılmaz"),
            detail(hotel, client_id, "Mehmet Yılmaz"),
        ];

        let doc = client_invoice_document(
            "AK SERAGOLU TURIZM",
            &ClientInvoiceInput {
                client_id,
                client_name: "Mehmet Yılmaz",
                email: None,
                invoice_date: NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
                services: &services,
            },
        );
        let texts = doc.texts();

        assert!(texts.iter().any(|t| t.starts_with("Invoice Serial: INV-20240520-")));
        assert!(texts.contains(&"Client: Mehmet Yilmaz"));
        assert!(texts.contains(&"Email: No email provided"));
        assert!(texts.contains(&"Arrival Date: 2024-05-10"));
        assert!(texts.contains(&"Tours and Car Rentals"));
        assert!(texts.contains(&"2024-05-10"));
        assert!(texts.contains(&"Ciragan Palace"));
        assert!(texts.contains(&"Hotels/Bungalows"));
        assert!(texts.contains(&"$200.00"));
        assert!(texts.contains(&"$250.00"));
    }

    #[test]
    fn test_client_document_without_services() {
        let doc = client_invoice_document(
            "AK",
            &ClientInvoiceInput {
                client_id: Uuid::new_v4(),
                client_name: "Empty Client",
                email: Some("e@example.com"),
                invoice_date: NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
                services: &[],
            },
        );
        let texts = doc.texts();
        assert!(texts.contains(&"Arrival Date: N/A"));
        assert!(texts.contains(&"No services found for this client."));
        assert!(!texts.contains(&"Total Amount"));
    }

    #[test]
    fn test_monthly_serial_uses_issue_date() {
        let mut invoice = monthly(dec!(10), dec!(5));
        invoice.invoice_month = 12;
        invoice.invoice_year = 2023;
        invoice.invoice_date = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();

        let serial = monthly_serial("COMP", &invoice);
        assert!(serial.starts_with("COMP-202401-"), "{}", serial);
        assert!(serial.ends_with(&short_id(invoice.id)));
    }

    #[test]
    fn test_monthly_documents() {
        let company = company();
        let items = vec![
            item("Ali Demir", "Tour", dec!(40), dec!(60)),
            item("Ali Demir", "Hotel", dec!(100), dec!(150)),
        ];
        let invoice = monthly(dec!(210), dec!(140));
        let input = MonthlyInvoiceInput {
            invoice: &invoice,
            company: &company,
            items: &items,
        };

        let partner = monthly_invoice_document("AK", MonthlyInvoiceType::PartnerCompany, &input);
        let texts = partner.texts();
        assert_eq!(partner.title, "Monthly Company Invoice");
        assert!(texts.iter().any(|t| t.starts_with("Invoice Serial: COMP-202406-")));
        assert!(texts.contains(&"Period: May 2024"));
        assert!(texts.contains(&"Company: Oz Turizm"));
        assert!(texts.contains(&"Contact Person: Ayse"));
        assert!(texts.contains(&"TOTALS"));
        assert!(texts.contains(&"$210.00"));

        let internal = monthly_invoice_document("AK", MonthlyInvoiceType::MyCompany, &input);
        let texts = internal.texts();
        assert!(texts.iter().any(|t| t.starts_with("Invoice Serial: INT-202406-")));
        assert!(texts.contains(&"Financial Summary"));
        assert!(texts.contains(&"$140.00"));
        assert!(texts.contains(&"$70.00"));
    }

    #[test]
    fn test_filenames() {
        assert_eq!(
            monthly_invoice_filename("Öz Turizm Ltd.", 5, 2024, MonthlyInvoiceType::MyCompany),
            "monthly_invoice_Oz_Turizm_Ltd._5_2024_my_company.pdf"
        );
        assert_eq!(
            client_invoice_filename("Ali Demir", Uuid::new_v4(), Some((3, 2024))),
            "client_invoice_Ali_Demir_3_2024.pdf"
        );
        assert_eq!(download_path("x.pdf"), "/api/invoices/download/x.pdf");
    }

    #[tokio::test]
    async fn test_write_invoice_produces_pdf_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = InvoiceDocument::new("AK SERAGOLU TURIZM", "Client Detailed Invoice");
        for i in 0..60 {
            doc.row(
                vec![
                    Cell::new(format!("Row {}", i), 120.0, Align::Left),
                    Cell::new(money(Decimal::from(i)), 40.0, Align::Right),
                ],
                Weight::Regular,
            );
        }

        let path = write_invoice(dir.path(), "test.pdf", &doc).await.unwrap();
        let bytes = std::fs::read(path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
