// ABOUTME: UI text tables for MSSQL Manager
// ABOUTME: English and Turkish strings selected by the language setting

use crate::config::{Language, Theme};

/// Every piece of text the UI shows. Templates use `{}` for positional arguments.
pub struct Strings {
    pub app_title: &'static str,
    pub connection: &'static str,
    pub table_management: &'static str,
    pub insert_data: &'static str,
    pub view_data: &'static str,
    pub settings: &'static str,

    pub server_name: &'static str,
    pub database_name: &'static str,
    pub connect: &'static str,
    pub create_database: &'static str,
    pub disconnect: &'static str,
    pub status: &'static str,
    pub not_connected: &'static str,
    pub connected: &'static str,
    pub disconnected: &'static str,
    pub connection_failed: &'static str,
    pub database_created: &'static str,
    pub creation_failed: &'static str,
    pub trusted_as: &'static str,
    pub connected_to: &'static str,
    pub not_connected_info: &'static str,

    pub table_name: &'static str,
    pub column_name: &'static str,
    pub data_type: &'static str,
    pub primary_key: &'static str,
    pub not_null: &'static str,
    pub remove: &'static str,
    pub add_column: &'static str,
    pub create_table: &'static str,
    pub delete_table: &'static str,
    pub refresh: &'static str,
    pub tables: &'static str,
    pub table_created: &'static str,
    pub table_deleted: &'static str,
    pub confirm_delete_title: &'static str,
    pub confirm_delete: &'static str,
    pub yes_no: &'static str,

    pub select_table: &'static str,
    pub insert: &'static str,
    pub enter_number: &'static str,
    pub enter_decimal: &'static str,
    pub datetime_format: &'static str,
    pub enter_type: &'static str,
    pub data_inserted: &'static str,
    pub no_table_selected: &'static str,

    pub view_table: &'static str,
    pub sql_query: &'static str,
    pub execute_query: &'static str,
    pub results: &'static str,
    pub displaying_rows: &'static str,
    pub query_executed: &'static str,

    pub theme: &'static str,
    pub language: &'static str,
    pub save_settings: &'static str,
    pub settings_saved: &'static str,
    pub restart_note: &'static str,
    pub theme_system: &'static str,
    pub theme_light: &'static str,
    pub theme_dark: &'static str,

    pub error: &'static str,
    pub success: &'static str,
    pub info: &'static str,
    pub working: &'static str,
    pub dismiss: &'static str,
    pub help: &'static str,
}

static EN: Strings = Strings {
    app_title: "MS SQL Server Database Manager",
    connection: "Connection",
    table_management: "Table Management",
    insert_data: "Insert Data",
    view_data: "View Data",
    settings: "Settings",

    server_name: "Server Name:",
    database_name: "Database Name:",
    connect: "Connect",
    create_database: "Create Database",
    disconnect: "Disconnect",
    status: "Status:",
    not_connected: "Not Connected",
    connected: "Connected Successfully",
    disconnected: "Disconnected",
    connection_failed: "Connection Failed",
    database_created: "Database {} Created",
    creation_failed: "Creation Failed",
    trusted_as: "Trusted connection as {}",
    connected_to: "Successfully connected to {} on {}!",
    not_connected_info: "Not connected to any database.",

    table_name: "Table Name:",
    column_name: "Column Name",
    data_type: "Data Type",
    primary_key: "Primary Key",
    not_null: "Not Null",
    remove: "Remove",
    add_column: "Add Column",
    create_table: "Create Table",
    delete_table: "Delete Table",
    refresh: "Refresh",
    tables: "Tables",
    table_created: "Table {} created successfully!",
    table_deleted: "Table {} deleted successfully!",
    confirm_delete_title: "Confirm Delete",
    confirm_delete: "Are you sure you want to delete table {}?",
    yes_no: "[y] Yes   [n] No",

    select_table: "Select Table:",
    insert: "Insert",
    enter_number: "Enter number",
    enter_decimal: "Enter decimal number",
    datetime_format: "YYYY-MM-DD HH:MM:SS",
    enter_type: "Enter {}",
    data_inserted: "Data inserted successfully!",
    no_table_selected: "Please select a table!",

    view_table: "View Table",
    sql_query: "SQL Query:",
    execute_query: "Execute Query",
    results: "Results",
    displaying_rows: "Displaying {} rows from {}",
    query_executed: "Query executed successfully. {} rows returned.",

    theme: "Theme:",
    language: "Language:",
    save_settings: "Save Settings",
    settings_saved: "Settings saved.",
    restart_note: "Note: Some changes may require restarting the application",
    theme_system: "System",
    theme_light: "Light",
    theme_dark: "Dark",

    error: "Error",
    success: "Success",
    info: "Info",
    working: "Working...",
    dismiss: "[Enter] OK",
    help: "F1-F5 tabs | Tab/Shift+Tab move | Enter activate | Space toggle | ←/→ choose | Ctrl+R run query | Ctrl+Q quit",
};

static TR: Strings = Strings {
    app_title: "MS SQL Server Veritabanı Yöneticisi",
    connection: "Bağlantı",
    table_management: "Tablo Yönetimi",
    insert_data: "Veri Ekle",
    view_data: "Veri Görüntüle",
    settings: "Ayarlar",

    server_name: "Sunucu Adı:",
    database_name: "Veritabanı Adı:",
    connect: "Bağlan",
    create_database: "Veritabanı Oluştur",
    disconnect: "Bağlantıyı Kes",
    status: "Durum:",
    not_connected: "Bağlı Değil",
    connected: "Bağlantı Başarılı",
    disconnected: "Bağlantı Kesildi",
    connection_failed: "Bağlantı Başarısız",
    database_created: "{} Veritabanı Oluşturuldu",
    creation_failed: "Oluşturma Başarısız",
    trusted_as: "{} olarak güvenilir bağlantı",
    connected_to: "{} veritabanına ({}) başarıyla bağlanıldı!",
    not_connected_info: "Herhangi bir veritabanına bağlı değil.",

    table_name: "Tablo Adı:",
    column_name: "Sütun Adı",
    data_type: "Veri Tipi",
    primary_key: "Birincil Anahtar",
    not_null: "Boş Olamaz",
    remove: "Kaldır",
    add_column: "Sütun Ekle",
    create_table: "Tablo Oluştur",
    delete_table: "Tabloyu Sil",
    refresh: "Yenile",
    tables: "Tablolar",
    table_created: "{} tablosu başarıyla oluşturuldu!",
    table_deleted: "{} tablosu başarıyla silindi!",
    confirm_delete_title: "Silmeyi Onayla",
    confirm_delete: "{} tablosunu silmek istediğinizden emin misiniz?",
    yes_no: "[y] Evet   [n] Hayır",

    select_table: "Tablo Seç:",
    insert: "Ekle",
    enter_number: "Sayı girin",
    enter_decimal: "Ondalık sayı girin",
    datetime_format: "YYYY-AA-GG SS:DD:ss",
    enter_type: "{} girin",
    data_inserted: "Veri başarıyla eklendi!",
    no_table_selected: "Lütfen bir tablo seçin!",

    view_table: "Tabloyu Görüntüle",
    sql_query: "SQL Sorgusu:",
    execute_query: "Sorguyu Çalıştır",
    results: "Sonuçlar",
    displaying_rows: "{} satır {} tablosundan görüntüleniyor",
    query_executed: "Sorgu başarıyla çalıştırıldı. {} satır döndürüldü.",

    theme: "Tema:",
    language: "Dil:",
    save_settings: "Ayarları Kaydet",
    settings_saved: "Ayarlar kaydedildi.",
    restart_note: "Not: Bazı değişiklikler uygulamanın yeniden başlatılmasını gerektirebilir",
    theme_system: "Sistem",
    theme_light: "Açık",
    theme_dark: "Koyu",

    error: "Hata",
    success: "Başarılı",
    info: "Bilgi",
    working: "Çalışıyor...",
    dismiss: "[Enter] Tamam",
    help: "F1-F5 sekmeler | Tab/Shift+Tab gezin | Enter çalıştır | Boşluk seç | ←/→ değiştir | Ctrl+R sorgu | Ctrl+Q çıkış",
};

pub fn strings(lang: Language) -> &'static Strings {
    match lang {
        Language::En => &EN,
        Language::Tr => &TR,
    }
}

impl Strings {
    pub fn theme_name(&self, theme: Theme) -> &'static str {
        match theme {
            Theme::System => self.theme_system,
            Theme::Light => self.theme_light,
            Theme::Dark => self.theme_dark,
        }
    }
}

/// Language names are shown in their own language
pub fn language_name(lang: Language) -> &'static str {
    match lang {
        Language::En => "English",
        Language::Tr => "Türkçe",
    }
}

/// Substitute `{}` markers left to right
pub fn fill(template: &str, args: &[&dyn std::fmt::Display]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut rest = template;
    while let Some(pos) = rest.find("{}") {
        out.push_str(&rest[..pos]);
        match args.next() {
            Some(arg) => out.push_str(&arg.to_string()),
            None => out.push_str("{}"),
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill() {
        assert_eq!(
            fill(strings(Language::En).displaying_rows, &[&3, &"Users"]),
            "Displaying 3 rows from Users"
        );
        assert_eq!(fill("{} and {}", &[&1]), "1 and {}");
        assert_eq!(fill("no markers", &[&1]), "no markers");
    }

    #[test]
    fn test_language_switch() {
        assert_eq!(strings(Language::En).connect, "Connect");
        assert_eq!(strings(Language::Tr).connect, "Bağlan");
        assert_eq!(strings(Language::Tr).theme_name(Theme::Dark), "Koyu");
    }
}
