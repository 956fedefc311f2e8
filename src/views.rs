//! Server-rendered HTML for the admin pages and the public QR page.
use crate::catalog::PickedProduct;
use crate::entities::qr_code::Destination;
use crate::form::{FormSnapshot, ValidationErrors};
use crate::qr_codes::SupplementedQrCode;
use axum::http::StatusCode;
use chrono::DateTime;

const TRUNCATE_AT: usize = 25;
const EMPTY_STATE_IMAGE: &str =
    "https://cdn.shopify.com/s/files/1/0262/4071/2726/files/emptystate-files.png";

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Shorten to 25 characters, marking the cut with an ellipsis.
pub fn truncate(s: &str) -> String {
    if s.chars().count() > TRUNCATE_AT {
        let mut short: String = s.chars().take(TRUNCATE_AT - 1).collect();
        short.push('…');
        short
    } else {
        s.to_string()
    }
}

/// `Mon Jan 01 2024`
pub fn format_date(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|d| d.format("%a %b %d %Y").to_string())
        .unwrap_or_default()
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, sans-serif; margin: 0; background: #f6f6f7; color: #202223; }}
        header {{ display: flex; justify-content: space-between; align-items: center; padding: 12px 24px; background: #fff; border-bottom: 1px solid #e1e3e5; }}
        main {{ max-width: 1000px; margin: 24px auto; padding: 0 24px; }}
        .card {{ background: #fff; border-radius: 8px; box-shadow: 0 1px 2px rgba(0,0,0,.15); padding: 16px; margin-bottom: 16px; }}
        table {{ width: 100%; border-collapse: collapse; }}
        th, td {{ text-align: left; padding: 8px; border-bottom: 1px solid #e1e3e5; }}
        .thumb {{ width: 40px; height: 40px; object-fit: cover; border-radius: 4px; background: #e1e3e5; }}
        .critical {{ color: #d72c0d; }}
        .error {{ color: #d72c0d; font-size: 0.9em; }}
        .notice {{ background: #fff5ea; padding: 8px 12px; border-radius: 4px; }}
        .button {{ display: inline-block; padding: 8px 16px; border-radius: 4px; border: 1px solid #8c9196; background: #fff; color: #202223; text-decoration: none; cursor: pointer; }}
        .primary {{ background: #008060; border-color: #008060; color: #fff; }}
        .destructive {{ border-color: #d72c0d; color: #d72c0d; }}
        .qr {{ width: 100%; max-width: 280px; }}
    </style>
</head>
<body>
{body}
</body>
</html>"#,
        title = html_escape(title),
        body = body
    )
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    layout(
        message,
        &format!(
            r#"<main><div class="card"><h1>{}</h1><p>{}</p></div></main>"#,
            status.as_u16(),
            html_escape(message)
        ),
    )
}

pub fn login_page(error: Option<&str>) -> String {
    let error_html = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, html_escape(e)))
        .unwrap_or_default();

    layout(
        "Sign in",
        &format!(
            r#"<main>
    <div class="card">
        <h1>Sign in to QR codes</h1>
        {error_html}
        <form method="post" action="/auth/login">
            <p><label for="session">Shop session token</label></p>
            <p><input id="session" name="session" type="password" required autocomplete="off"></p>
            <button class="button primary" type="submit">Sign in</button>
        </form>
    </div>
</main>"#
        ),
    )
}

fn app_header(title: &str, action: &str) -> String {
    format!(
        r#"<header><strong>{}</strong>{}</header>"#,
        html_escape(title),
        action
    )
}

fn thumbnail(source: Option<&str>, alt: &str) -> String {
    match source {
        Some(src) => format!(
            r#"<img class="thumb" src="{}" alt="{}">"#,
            html_escape(src),
            html_escape(alt)
        ),
        None => format!(r#"<div class="thumb" title="{}"></div>"#, html_escape(alt)),
    }
}

pub fn list_page(qr_codes: &[SupplementedQrCode]) -> String {
    let header = app_header(
        "QR codes",
        r#"<a class="button primary" href="/app/qrcodes/new">Create QR code</a>"#,
    );

    let content = if qr_codes.is_empty() {
        format!(
            r#"<div class="card" style="text-align: center;">
    <img src="{EMPTY_STATE_IMAGE}" alt="" style="max-width: 220px;">
    <h2>Create unique QR codes for your product</h2>
    <p>Allow customers to scan codes and buy products using their phones.</p>
    <a class="button primary" href="/app/qrcodes/new">Create QR code</a>
</div>"#
        )
    } else {
        let rows: String = qr_codes.iter().map(list_row).collect();
        format!(
            r#"<div class="card">
<table>
    <thead>
        <tr><th><span hidden>Thumbnail</span></th><th>Title</th><th>Product</th><th>Date created</th><th>Scans</th></tr>
    </thead>
    <tbody>
{rows}    </tbody>
</table>
</div>"#
        )
    };

    layout("QR codes", &format!("{header}\n<main>\n{content}\n</main>"))
}

fn list_row(qr: &SupplementedQrCode) -> String {
    let product_title = truncate(qr.product_title.as_deref().unwrap_or_default());
    let product_cell = if qr.product_deleted {
        format!(
            r#"<span class="critical" title="product has been deleted">&#9888; {}</span>"#,
            html_escape(&product_title)
        )
    } else {
        html_escape(&product_title)
    };

    format!(
        r#"        <tr>
            <td>{thumb}</td>
            <td><a href="/app/qrcodes/{id}">{title}</a></td>
            <td>{product_cell}</td>
            <td>{created}</td>
            <td>{scans}</td>
        </tr>
"#,
        thumb = thumbnail(qr.product_image.as_deref(), "product image or placeholder"),
        id = qr.qr_code.id,
        title = html_escape(&truncate(&qr.qr_code.title)),
        created = format_date(qr.qr_code.created_at),
        scans = qr.qr_code.scans,
    )
}

/// Everything the editor page shows.
#[derive(Debug, Clone)]
pub struct FormView {
    /// `None` while creating.
    pub id: Option<i32>,
    pub clean: FormSnapshot,
    pub current: FormSnapshot,
    /// Stored variant and handle, re-submitted so an unchanged product
    /// keeps them. Empty while creating.
    pub product_variant_id: String,
    pub product_handle: String,
    pub product_title: Option<String>,
    pub product_image: Option<String>,
    pub product_alt: Option<String>,
    pub destination_url: Option<String>,
    pub image: Option<String>,
    pub products: Vec<PickedProduct>,
    pub errors: ValidationErrors,
}

impl FormView {
    pub fn new_qr_code(products: Vec<PickedProduct>) -> Self {
        Self {
            id: None,
            clean: FormSnapshot::empty(),
            current: FormSnapshot::empty(),
            product_variant_id: String::new(),
            product_handle: String::new(),
            product_title: None,
            product_image: None,
            product_alt: None,
            destination_url: None,
            image: None,
            products,
            errors: ValidationErrors::default(),
        }
    }

    pub fn existing(qr: &SupplementedQrCode, products: Vec<PickedProduct>) -> Self {
        let snapshot = FormSnapshot::from_qr_code(&qr.qr_code);
        Self {
            id: Some(qr.qr_code.id),
            clean: snapshot.clone(),
            current: snapshot,
            product_variant_id: qr.qr_code.product_variant_id.clone(),
            product_handle: qr.qr_code.product_handle.clone(),
            product_title: qr.product_title.clone(),
            product_image: qr.product_image.clone(),
            product_alt: qr.product_alt.clone(),
            destination_url: Some(qr.destination_url.clone()),
            image: Some(qr.image.clone()),
            products,
            errors: ValidationErrors::default(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.current != self.clean
    }
}

fn field_error(errors: &ValidationErrors, field: &str) -> String {
    errors
        .get(field)
        .map(|e| format!(r#"<p class="error">{}</p>"#, html_escape(e)))
        .unwrap_or_default()
}

fn product_options(view: &FormView) -> String {
    let selected = view.current.product_id.as_str();
    let mut options = String::from(r#"<option value="">Select product</option>"#);
    let mut listed = false;

    for product in &view.products {
        let is_selected = product.id == selected;
        listed |= is_selected;
        options.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            html_escape(&product.id),
            if is_selected { " selected" } else { "" },
            html_escape(&product.title)
        ));
    }

    // Keep the stored product selectable even when the picker page does not list it
    if !selected.is_empty() && !listed {
        let label = view
            .product_title
            .clone()
            .unwrap_or_else(|| "Deleted product".to_string());
        options.push_str(&format!(
            r#"<option value="{}" selected>{}</option>"#,
            html_escape(selected),
            html_escape(&label)
        ));
    }

    options
}

fn destination_choice(view: &FormView, destination: Destination, label: &str) -> String {
    let checked = view.current.destination == destination.as_str();
    format!(
        r#"<p><label><input type="radio" name="destination" value="{}"{}> {}</label></p>"#,
        destination,
        if checked { " checked" } else { "" },
        label
    )
}

pub fn form_page(view: &FormView) -> String {
    let heading = if view.id.is_some() {
        "Edit QR code"
    } else {
        "Create new QR code"
    };
    let header = app_header(
        heading,
        r#"<a class="button" href="/app">QR codes</a>"#,
    );
    let action = match view.id {
        Some(id) => format!("/app/qrcodes/{id}"),
        None => "/app/qrcodes/new".to_string(),
    };

    let notice = if view.is_dirty() {
        r#"<p class="notice">Unsaved changes</p>"#
    } else {
        ""
    };

    let selected_product = if view.current.product_id.is_empty() {
        String::new()
    } else {
        format!(
            r#"<p>{} <strong>{}</strong></p>"#,
            thumbnail(
                view.product_image.as_deref(),
                view.product_alt.as_deref().unwrap_or_default()
            ),
            html_escape(view.product_title.as_deref().unwrap_or_default())
        )
    };

    let destination_link = view
        .destination_url
        .as_deref()
        .map(|url| {
            format!(
                r#"<p><a href="{}" target="_blank" rel="noopener">Go to destination URL</a></p>"#,
                html_escape(url)
            )
        })
        .unwrap_or_default();

    let preview = match (&view.image, view.id) {
        (Some(image), Some(id)) => format!(
            r#"<img class="qr" src="{image}" alt="QR code">
        <p><a class="button primary" href="{image}" download="qrcode-{id}.png">Download</a></p>
        <p><a class="button" href="/qrcodes/{id}" target="_blank" rel="noopener">Go to public URL</a></p>"#,
            image = html_escape(image),
            id = id
        ),
        _ => r#"<p>Your QR code will appear here after you save</p>"#.to_string(),
    };

    let delete_form = match view.id {
        Some(id) => format!(
            r#"<form method="post" action="/app/qrcodes/{id}">
            <input type="hidden" name="intent" value="delete">
            <button class="button destructive" type="submit">Delete</button>
        </form>"#
        ),
        None => String::new(),
    };

    let body = format!(
        r#"{header}
<main>
    {notice}
    <form method="post" action="{action}">
        <input type="hidden" name="intent" value="save">
        <input type="hidden" name="cleanTitle" value="{clean_title}">
        <input type="hidden" name="cleanProductId" value="{clean_product_id}">
        <input type="hidden" name="cleanDestination" value="{clean_destination}">
        <input type="hidden" name="productVariantId" value="{product_variant_id}">
        <input type="hidden" name="productHandle" value="{product_handle}">
        <div class="card">
            <h2>Title</h2>
            <input id="title" name="title" type="text" autocomplete="off" value="{title}">
            <p><small>Only store staff can see this title</small></p>
            {title_error}
        </div>
        <div class="card">
            <h2>Product</h2>
            {selected_product}
            <select name="productId" id="select-product">{options}</select>
            {product_error}
            <hr>
            <fieldset>
                <legend>Scan destination</legend>
                {choice_product}
                {choice_cart}
            </fieldset>
            {destination_error}
            {destination_link}
        </div>
        <p><button class="button primary" type="submit">Save</button></p>
    </form>
    <div class="card">
        <h2>QR code</h2>
        {preview}
    </div>
    {delete_form}
</main>"#,
        clean_title = html_escape(&view.clean.title),
        clean_product_id = html_escape(&view.clean.product_id),
        clean_destination = html_escape(&view.clean.destination),
        product_variant_id = html_escape(&view.product_variant_id),
        product_handle = html_escape(&view.product_handle),
        title = html_escape(&view.current.title),
        title_error = field_error(&view.errors, "title"),
        options = product_options(view),
        product_error = field_error(&view.errors, "productId"),
        choice_product = destination_choice(view, Destination::Product, "Link to product page"),
        choice_cart = destination_choice(
            view,
            Destination::Cart,
            "Link to checkout page with product in the cart"
        ),
        destination_error = field_error(&view.errors, "destination"),
    );

    layout(heading, &body)
}

pub fn public_page(title: &str, image: &str) -> String {
    layout(
        title,
        &format!(
            r#"<main>
    <div class="card" style="text-align: center;">
        <h1>{}</h1>
        <img class="qr" src="{}" alt="QR code">
    </div>
</main>"#,
            html_escape(title),
            html_escape(image)
        ),
    )
}
