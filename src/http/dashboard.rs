//! Live dashboard page served at `/`
//!
//! Self-contained HTML that polls `/history` once a second and rebuilds
//! the telemetry table in place. No templating; the page is static and
//! all data flows through the JSON endpoint.

/// The dashboard document, served verbatim
pub const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>GPS Telemetry</title>
    <style>
        table {
            width: 100%;
            border-collapse: collapse;
        }
        table, th, td {
            border: 1px solid black;
        }
        th, td {
            padding: 8px;
            text-align: left;
        }
        th {
            background-color: #f2f2f2;
        }
    </style>
    <script>
        function fetchData() {
            fetch('/history')
                .then(response => response.json())
                .then(data => {
                    const tableBody = document.getElementById('gpsTableBody');
                    tableBody.innerHTML = '';

                    data.forEach(entry => {
                        const row = document.createElement('tr');
                        row.innerHTML = `
                            <td>${entry.timestamp || 'N/A'}</td>
                            <td>${entry.latitude || 'N/A'}</td>
                            <td>${entry.longitude || 'N/A'}</td>
                            <td>${entry.altitude || 'N/A'}</td>
                            <td>${entry.speed || 'N/A'}</td>
                            <td>${entry.satellites || 'N/A'}</td>
                        `;
                        tableBody.appendChild(row);
                    });
                })
                .catch(error => console.error('Error fetching data:', error));
        }

        // Refresh the table once a second
        setInterval(fetchData, 1000);

        window.onload = fetchData;
    </script>
</head>
<body>
    <h1>GPS Telemetry</h1>
    <table>
        <thead>
            <tr>
                <th>Timestamp</th>
                <th>Latitude</th>
                <th>Longitude</th>
                <th>Altitude</th>
                <th>Speed</th>
                <th>Satellites</th>
            </tr>
        </thead>
        <tbody id="gpsTableBody">
        </tbody>
    </table>
    <br>
    <a href="/history">View History (JSON)</a>
    <br>
    <a href="/download">Download GPS Data as HTML</a>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_polls_history_endpoint() {
        assert!(DASHBOARD_HTML.contains("fetch('/history')"));
        assert!(DASHBOARD_HTML.contains("setInterval(fetchData, 1000)"));
    }

    #[test]
    fn test_dashboard_links_to_download() {
        assert!(DASHBOARD_HTML.contains("href=\"/download\""));
    }
}
