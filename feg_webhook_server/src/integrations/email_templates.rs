//! Email bodies for order notifications. Every message has an HTML part and a plain-text alternative.
use std::fmt::Write;

use feg_mailer::Email;
use feg_order_engine::{
    checkout::FailedPayment,
    db_types::{Order, OrderItem, ProductVariant, ShippingAddress},
    traits::CustomerInfo,
};

const STORE_NAME: &str = "Fibre Elite Glow";
const DASHBOARD_URL: &str = "https://dashboard.stripe.com";

pub fn order_confirmation(order: &Order, items: &[OrderItem], email: &str, support_email: &str) -> Email {
    let subject = format!("Order Confirmation - {}", order.order_number);
    let date = order.created_at.format("%B %-d, %Y");
    let address = &order.shipping_address.0;
    let greeting = match order.customer_name.split_whitespace().next() {
        Some(first) => format!("Hi {first},"),
        None => "Hi there,".to_string(),
    };

    let mut html = String::new();
    let _ = write!(
        html,
        "<h1>Thank you for your order!</h1><p>{}</p><p>We've received your order and will let you know as soon as it \
         ships.</p><p><strong>Order number:</strong> {}<br/><strong>Order date:</strong> {date}<br/><strong>Total:\
         </strong> {} {}</p>",
        escape_html(&greeting),
        order.order_number,
        order.total,
        order.currency
    );
    html.push_str(&items_table_html(items));
    if !address.is_blank() {
        let _ = write!(html, "<h3>Shipping to</h3><p>{}</p>", address_html(address));
    }
    let _ = write!(
        html,
        "<p>Questions? Reply to this email or write to <a href=\"mailto:{support_email}\">{support_email}</a>.</p>"
    );

    let mut text = String::new();
    let _ = writeln!(text, "Thank you for your order!\n\n{greeting}\n");
    let _ = writeln!(text, "Order number: {}", order.order_number);
    let _ = writeln!(text, "Order date: {date}");
    let _ = writeln!(text, "Total: {} {}\n", order.total, order.currency);
    text.push_str(&items_text(items));
    if !address.is_blank() {
        let _ = writeln!(text, "\nShipping to: {address}");
    }
    let _ = writeln!(text, "\nQuestions? Write to {support_email}.\n\n{STORE_NAME}");

    Email::new(email, subject).with_html(html).with_text(text)
}

pub fn admin_order_alert(order: &Order, items: &[OrderItem], customer: &CustomerInfo, admin_email: &str) -> Email {
    let test = if order.test_mode { "[TEST] " } else { "" };
    let subject = format!("{test}New order {} - {} {}", order.order_number, order.total, order.currency);
    let phone = customer.phone.as_deref().unwrap_or("not provided");
    let link = order.payment_intent.as_deref().map(|pi| payment_link(pi, order.test_mode));

    let mut html = String::new();
    let _ = write!(
        html,
        "<h1>New order received</h1><p><strong>Order number:</strong> {}<br/><strong>Session:</strong> {}<br/>\
         <strong>Total:</strong> {} {}<br/><strong>Payment status:</strong> {}</p><h3>Customer</h3><p>{}<br/>{}<br/>\
         {}</p>",
        order.order_number,
        escape_html(order.session_id.as_str()),
        order.total,
        order.currency,
        order.payment_status,
        escape_html(&customer.name),
        escape_html(&customer.email),
        escape_html(phone)
    );
    let _ = write!(html, "<h3>Shipping address</h3><p>{}</p>", address_html(&customer.shipping_address));
    html.push_str(&items_table_html(items));
    if let Some(link) = &link {
        let _ = write!(html, "<p><a href=\"{link}\">View the payment in the dashboard</a></p>");
    }

    let mut text = String::new();
    let _ = writeln!(text, "New order received\n");
    let _ = writeln!(text, "Order number: {}", order.order_number);
    let _ = writeln!(text, "Session: {}", order.session_id);
    let _ = writeln!(text, "Total: {} {}", order.total, order.currency);
    let _ = writeln!(text, "Payment status: {}\n", order.payment_status);
    let _ = writeln!(text, "Customer: {}\nEmail: {}\nPhone: {phone}", customer.name, customer.email);
    let _ = writeln!(text, "Shipping address: {}\n", customer.shipping_address);
    text.push_str(&items_text(items));
    if items.is_empty() {
        text.push_str("\nThis order has no recorded items and needs a manual review.\n");
    }
    if let Some(link) = &link {
        let _ = writeln!(text, "\nDashboard: {link}");
    }

    Email::new(admin_email, subject).with_html(html).with_text(text)
}

pub fn payment_failure_alert(payment: &FailedPayment, admin_email: &str) -> Email {
    let test = if payment.test_mode { "[TEST] " } else { "" };
    let subject = format!("{test}Payment failed - {} {}", payment.amount, payment.currency);
    let customer = if payment.customer_email.is_empty() { "unknown" } else { payment.customer_email.as_str() };
    let link = payment_link(&payment.payment_intent, payment.test_mode);
    let html = format!(
        "<h1>Payment failed</h1><p><strong>Payment:</strong> {}<br/><strong>Amount:</strong> {} {}<br/><strong>\
         Customer:</strong> {}<br/><strong>Reason:</strong> {}</p><p><a href=\"{link}\">View the payment in the \
         dashboard</a></p>",
        escape_html(&payment.payment_intent),
        payment.amount,
        payment.currency,
        escape_html(customer),
        escape_html(&payment.failure_reason)
    );
    let text = format!(
        "Payment failed\n\nPayment: {}\nAmount: {} {}\nCustomer: {customer}\nReason: {}\n\nDashboard: {link}\n",
        payment.payment_intent, payment.amount, payment.currency, payment.failure_reason
    );
    Email::new(admin_email, subject).with_html(html).with_text(text)
}

pub fn variant_label(variant: ProductVariant) -> &'static str {
    match variant {
        ProductVariant::TotalEssential => "Total Essential",
        ProductVariant::TotalEssentialPlus => "Total Essential Plus",
    }
}

fn payment_link(payment_intent: &str, test_mode: bool) -> String {
    let test = if test_mode { "/test" } else { "" };
    format!("{DASHBOARD_URL}{test}/payments/{payment_intent}")
}

fn items_table_html(items: &[OrderItem]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let mut html = String::from(
        "<table><thead><tr><th>Product</th><th>Variant</th><th>Qty</th><th>Price</th><th>Total</th></tr></thead><tbody>",
    );
    for item in items {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&item.product_name),
            variant_label(item.variant),
            item.quantity,
            item.unit_price,
            item.total_price
        );
    }
    html.push_str("</tbody></table>");
    html
}

fn items_text(items: &[OrderItem]) -> String {
    let mut text = String::new();
    for item in items {
        let _ = writeln!(
            text,
            "  {} x {} ({}) @ {} = {}",
            item.quantity,
            item.product_name,
            variant_label(item.variant),
            item.unit_price,
            item.total_price
        );
    }
    text
}

fn address_html(address: &ShippingAddress) -> String {
    let mut lines = vec![escape_html(&address.line1)];
    if let Some(line2) = address.line2.as_ref().filter(|l| !l.is_empty()) {
        lines.push(escape_html(line2));
    }
    lines.push(format!(
        "{}, {} {}",
        escape_html(&address.city),
        escape_html(&address.state),
        escape_html(&address.postal_code)
    ));
    lines.push(escape_html(&address.country));
    lines.join("<br/>")
}

fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            c => result.push(c),
        }
    }
    result
}
