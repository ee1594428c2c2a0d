//! Built-in starter corpus for an empty knowledge base.

use super::types::Document;

pub fn sample_documents() -> Vec<Document> {
    vec![
        Document::new(
            "Return Policy",
            "Our return policy lets you return any item within 30 days of delivery for a full \
             refund. Items must be unused and in their original packaging. To start a return, \
             open your order history, choose the order and select Request Return. Once the \
             returned item reaches our warehouse, the refund is issued to the original payment \
             method within 5 to 7 business days. Final sale items and gift cards cannot be \
             returned.",
        ),
        Document::new(
            "Shipping Information",
            "Standard shipping takes 3 to 5 business days and is free on orders over $50. \
             Express shipping delivers within 1 to 2 business days for a flat fee of $15. \
             Orders placed before 2 pm are dispatched the same day. International shipping is \
             available to most countries and usually arrives within 7 to 14 business days; \
             customs duties are paid by the recipient. A tracking link is emailed as soon as \
             the parcel leaves our warehouse.",
        ),
        Document::new(
            "Product Warranty",
            "Every device we sell includes a two-year limited warranty covering manufacturing \
             defects in materials and workmanship. The warranty does not cover accidental \
             damage, water damage or normal wear. To file a warranty claim, provide your order \
             number and a short description of the fault. Repaired or replacement devices \
             carry the remainder of the original warranty or 90 days, whichever is longer.",
        ),
        Document::new(
            "Support FAQ",
            "How do I reset my password? Use the Forgot Password link on the sign-in page and \
             follow the emailed instructions. How do I change my email address? Open Account \
             Settings and edit the contact details section. How do I reach a person? Our \
             support team answers live chat from 8 am to 8 pm on weekdays and replies to \
             emails within one business day.",
        ),
        Document::new(
            "API Documentation",
            "The public REST API authenticates requests with a bearer token sent in the \
             Authorization header. Tokens are created under Account Settings, Developer. All \
             responses are JSON. List endpoints are paginated with the page and per_page query \
             parameters, and clients are limited to 100 requests per minute; exceeding the \
             limit returns HTTP 429 with a Retry-After header.",
        ),
    ]
}
