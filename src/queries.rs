//! Fixed report SQL run against the Halo reporting endpoint.
//!
//! Both queries are parameterless; the reporting endpoint takes the
//! text verbatim with `_loadreportonly` set.

/// Active HaloITSM/HaloCRM clients never synced, or last synced more
/// than a month ago, joined to the invoice site's email domains.
pub const ENRICHMENT_CANDIDATES: &str = r#"
    SELECT
        aarea AS [Client ID],
        aareadesc AS [Client],
        PRODUCT.fvalue AS [Product],
        CONVERT(NVARCHAR,IIF(Astopped=1,'Stopped','Allowed')) AS [Account Status],
        AREA.CFProxycurlLastSynced AS [Proxycurl Last Synced],
        AREA.CFProxycurlPayload,
        [Main Site].SiteEmailDomain AS [Email Domains]
    FROM
        AREA
    LEFT JOIN LOOKUP PRODUCT ON AREA.cfproduct = PRODUCT.fcode AND PRODUCT.fid = 161
    LEFT JOIN (
        SELECT
            *,
            ROW_NUMBER() OVER (PARTITION BY SArea ORDER BY SArea ASC) AS [RowNo]
        FROM
            Site
        WHERE
            SIsInactive = 0
            AND SIsInvoiceSite = 1
    ) AS [Main Site] ON AArea = SArea AND [RowNo] = 1
    WHERE
        AREA.AIsInactive = 0
        AND AREA.Astopped = 0
        AND PRODUCT.fvalue IN ('HaloITSM', 'HaloCRM')
        AND (CFProxycurlLastSynced IS NULL OR CFProxycurlLastSynced <= DATEADD(MONTH, -1, GETDATE()))
"#;

/// Clients whose stored payload already carries a LinkedIn size figure
/// but whose derived employees field is still unset.
pub const DERIVED_CANDIDATES: &str = r#"
    SELECT
        aarea AS [Client ID],
        aareadesc AS [Client],
        PRODUCT.fvalue AS [Product],
        CONVERT(NVARCHAR,IIF(Astopped=1,'Stopped','Allowed')) AS [Account Status],
        AREA.CFProxycurlLastSynced AS [Proxycurl Last Synced]
    FROM
        AREA
    LEFT JOIN LOOKUP PRODUCT ON AREA.cfproduct = PRODUCT.fcode AND PRODUCT.fid = 161
    WHERE
        AREA.AIsInactive = 0
        AND AREA.Astopped = 0
        AND PRODUCT.fvalue IN ('HaloITSM', 'HaloCRM')
        AND CFProxycurlPayload LIKE '%company_size_on_linkedin%'
        AND CFEmployeesInLinkedIn IS NULL
"#;
