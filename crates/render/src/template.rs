/// Wrap an HTML body and a stylesheet into a standalone UTF-8 document.
///
/// The output is fixed: no escaping, no conditional sections.
pub fn wrap_document(html: &str, css: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset='UTF-8'>\n\
         <style>\n\
         {css}\n\
         </style>\n\
         </head>\n\
         <body>\n\
         {html}\n\
         </body>\n\
         </html>\n"
    )
}
