//! Services module
//!
//! Integraciones externas (WhatsApp, SMTP), plantillas de notificación
//! y generación de facturas PDF.

pub mod email_service;
pub mod notification_service;
pub mod notification_templates;
pub mod pdf_service;
pub mod whatsapp_service;
