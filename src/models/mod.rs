//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean
//! al schema PostgreSQL definido en `migrations/`.

pub mod booking;
pub mod client;
pub mod company;
pub mod driver;
pub mod invoice;
pub mod notification;
pub mod service;
pub mod vehicle;

pub use booking::{Booking, BookingStatus, BookingTotals, BookingWithClient, NewBooking};
pub use client::{Client, ClientSummary};
pub use company::{Company, CompanyWithCount};
pub use driver::Driver;
pub use invoice::{
    Invoice, InvoiceWithBooking, MonthlyCompanyInvoice, MonthlyInvoiceItem, MonthlyInvoiceType, MonthlyInvoiceWithCompany,
    NewMonthlyInvoiceItem,
};
pub use notification::{EmailSettings, MetaWhatsappSettings, Notification, Setting};
pub use service::{NewService, Service, ServiceDetail, ServiceType};
pub use vehicle::{Vehicle, VehicleOverview};
